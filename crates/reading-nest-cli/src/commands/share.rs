use clap::Subcommand;
use reading_nest_core::{Config, Snapshot, SnapshotView};
use serde_json::json;
use std::path::PathBuf;

use super::{open_nest, print_json, CliResult};

#[derive(Subcommand)]
pub enum ShareAction {
    /// Print a read-only snapshot link for the "now reading" book
    Link {
        /// Also save the link to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Open a snapshot link in read-only view
    Open { link: String },
}

pub fn run(action: ShareAction, config: &Config) -> CliResult {
    match action {
        ShareAction::Link { out } => {
            let nest = open_nest(config)?;
            let link = Snapshot::capture(&nest).to_link(&config.share.base_url)?;
            if let Some(path) = out {
                // Saving is a convenience; the printed link is the fallback.
                match std::fs::write(&path, format!("{link}\n")) {
                    Ok(()) => eprintln!("Share link saved to {}.", path.display()),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "could not save share link");
                        eprintln!("Could not save the link; here it is instead.");
                    }
                }
            }
            println!("{link}");
        }
        ShareAction::Open { link } => {
            let view = SnapshotView::open(&link)?;
            eprintln!("Viewing a shared snapshot (read-only).");
            print_json(&json!({
                "title": view.title(),
                "meta": view.meta_line(),
                "chips": view.chips(),
                "prompt": view.snapshot().prompt,
            }))?;
        }
    }
    Ok(())
}
