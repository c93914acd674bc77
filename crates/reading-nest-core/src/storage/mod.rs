mod config;
pub mod database;
pub mod document;

pub use config::{CardConfig, Config, LogConfig, ShareConfig, TimerConfig};
pub use database::Database;
pub use document::{reconcile, Document, DocumentStore, MemoryStore, DOCUMENT_KEY};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/reading-nest[-dev]/` based on READING_NEST_ENV.
///
/// Set READING_NEST_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("READING_NEST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("reading-nest-dev")
    } else {
        base_dir.join("reading-nest")
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
