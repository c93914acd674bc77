//! File exports and backup import.

use chrono::Local;
use clap::Subcommand;
use reading_nest_core::card::{self, CardContent};
use reading_nest_core::export::{backup_file_name, card_file_name, sessions_csv, sessions_file_name};
use reading_nest_core::{Config, Snapshot, SnapshotView};
use serde_json::json;
use std::path::{Path, PathBuf};

use super::{open_nest, output_path, print_json, write_file, CliResult};

#[derive(Subcommand)]
pub enum ExportAction {
    /// Full JSON backup of books, sessions and settings
    Backup {
        /// Directory to write into (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Session history as CSV, oldest first
    Csv {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        stdout: bool,
    },
    /// Reading card PNG
    Card {
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Render a shared snapshot link instead of your own nest
        #[arg(long)]
        from_link: Option<String>,
    },
}

pub fn run(action: ExportAction, config: &Config) -> CliResult {
    let today = Local::now().date_naive();

    match action {
        ExportAction::Backup { dir, stdout } => {
            let nest = open_nest(config)?;
            let body = nest.export_backup().to_pretty_json()?;
            if stdout {
                println!("{body}");
            } else {
                write_file(&output_path(dir, &backup_file_name(today)), body.as_bytes())?;
            }
        }
        ExportAction::Csv { dir, stdout } => {
            let nest = open_nest(config)?;
            let csv = sessions_csv(nest.books(), nest.sessions(), &Local)?;
            if stdout {
                print!("{csv}");
            } else {
                write_file(&output_path(dir, &sessions_file_name(today)), csv.as_bytes())?;
            }
        }
        ExportAction::Card { dir, from_link } => {
            let content = match from_link {
                // A shared snapshot is rendered without opening the store.
                Some(link) => {
                    let view = SnapshotView::open(&link)?;
                    CardContent::compose(view.snapshot(), None, &config.card)
                }
                None => {
                    let nest = open_nest(config)?;
                    let stats = nest.stats();
                    CardContent::compose(&Snapshot::capture(&nest), Some(&stats), &config.card)
                }
            };
            let png = card::render_png(&content.with_link(config.share.base_url.clone()))?;
            write_file(&output_path(dir, &card_file_name(today)), &png)?;
        }
    }
    Ok(())
}

pub fn import(file: &Path, config: &Config) -> CliResult {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
    let mut nest = open_nest(config)?;
    let summary = nest.import_backup(&raw)?;
    eprintln!("Imported.");
    print_json(&json!({
        "books": summary.books,
        "sessions": summary.sessions,
        "timerMinutes": nest.document().timer_minutes,
    }))
}
