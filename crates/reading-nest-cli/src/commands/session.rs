use clap::Subcommand;
use reading_nest_core::Config;
use serde_json::json;

use super::{open_nest, print_json, CliResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Log a session for the "now reading" book, using the configured length
    Log {
        /// Pages read this session
        #[arg(long)]
        pages: Option<u32>,
        /// How you feel afterwards
        #[arg(long)]
        mood: Option<String>,
    },
    /// List sessions, newest first
    List {
        /// Only sessions for this book
        #[arg(long)]
        book: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete every logged session
    Clear {
        /// Confirm; this cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: SessionAction, config: &Config) -> CliResult {
    let mut nest = open_nest(config)?;

    match action {
        SessionAction::Log { pages, mood } => {
            let session = nest.log_session(pages, mood)?;
            eprintln!("Session logged. Slow wins.");
            print_json(&session)?;
        }
        SessionAction::List { book, limit } => {
            let limit = limit.unwrap_or(usize::MAX);
            let sessions: Vec<_> = match &book {
                Some(id) => nest.recent_sessions(id, limit),
                None => nest.sessions().iter().take(limit).collect(),
            };
            print_json(&sessions)?;
        }
        SessionAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear all sessions without --yes".into());
            }
            let cleared = nest.clear_sessions()?;
            print_json(&json!({ "cleared": cleared }))?;
        }
    }
    Ok(())
}
