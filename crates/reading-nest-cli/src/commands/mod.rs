pub mod book;
pub mod completions;
pub mod config;
pub mod export;
pub mod prompt;
pub mod session;
pub mod share;
pub mod stats;
pub mod timer;

use reading_nest_core::storage::Database;
use reading_nest_core::{Config, Nest, TimerEngine};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// kv slot for the running timer, kept apart from the reading document so a
/// countdown survives between invocations.
const ENGINE_KEY: &str = "timer_engine";

/// Open the nest on the default database, with any persisted timer run.
pub fn open_nest(config: &Config) -> CliResult<Nest<Database>> {
    let db = Database::open()?;
    let engine_json = db.kv_get(ENGINE_KEY)?;
    let mut nest = Nest::open(db, config.timer.default_minutes)?;
    if let Some(json) = engine_json {
        match serde_json::from_str::<TimerEngine>(&json) {
            Ok(engine) => {
                nest.restore_timer(engine);
            }
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable timer state"),
        }
    }
    Ok(nest)
}

pub fn save_engine(nest: &Nest<Database>) -> CliResult {
    let json = serde_json::to_string(nest.timer())?;
    nest.store().kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `dir/name`, or `name` in the working directory.
pub fn output_path(dir: Option<PathBuf>, name: &str) -> PathBuf {
    dir.unwrap_or_else(|| PathBuf::from(".")).join(name)
}

pub fn write_file(path: &Path, bytes: &[u8]) -> CliResult {
    std::fs::write(path, bytes)
        .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote file");
    println!("{}", path.display());
    Ok(())
}
