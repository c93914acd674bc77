//! Shelf management commands for CLI.

use clap::Subcommand;
use reading_nest_core::shelf::StatusFilter;
use reading_nest_core::{Book, BookStatus, Config, ShelfFilter};
use serde_json::json;
use uuid::Uuid;

use super::{open_nest, print_json, CliResult};

#[derive(Subcommand)]
pub enum BookAction {
    /// Add a book to the shelf
    Add {
        /// Book title
        title: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        pages: Option<u32>,
        /// reading, to-read or finished (default: to-read)
        #[arg(long, default_value = "to-read")]
        status: BookStatus,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Edit a book in place
    Edit {
        /// Book ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Author ("" clears it)
        #[arg(long)]
        author: Option<String>,
        /// Page count (0 clears it)
        #[arg(long)]
        pages: Option<u32>,
        #[arg(long)]
        status: Option<BookStatus>,
        /// Notes ("" clears them)
        #[arg(long)]
        notes: Option<String>,
    },
    /// List the shelf
    List {
        /// Case-insensitive search over title, author and notes
        #[arg(long, short)]
        query: Option<String>,
        /// all, reading, to-read or finished
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Show one book with its latest sessions
    Show {
        id: String,
        #[arg(long, default_value = "5")]
        sessions: usize,
    },
    /// Remove a book and all of its sessions
    Remove { id: String },
    /// Show or set the "now reading" book
    Now {
        /// Book ID to make active
        id: Option<String>,
        /// Unset the active book
        #[arg(long, conflicts_with = "id")]
        clear: bool,
    },
    /// Mark a book as finished
    Finish { id: String },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn run(action: BookAction, config: &Config) -> CliResult {
    let mut nest = open_nest(config)?;
    let now = nest.clock().now_ms();

    match action {
        BookAction::Add {
            title,
            author,
            pages,
            status,
            notes,
        } => {
            let mut book = Book::new(Uuid::new_v4().to_string(), title.trim(), status);
            book.author = non_blank(author);
            book.pages = pages.filter(|p| *p > 0);
            book.notes = non_blank(notes);
            book.updated_at = now;
            nest.upsert_book(book.clone())?;
            print_json(&book)?;
        }
        BookAction::Edit {
            id,
            title,
            author,
            pages,
            status,
            notes,
        } => {
            let mut book = nest
                .book(&id)
                .cloned()
                .ok_or_else(|| format!("no book with id '{id}'"))?;
            if let Some(title) = title {
                book.title = title.trim().to_string();
            }
            if author.is_some() {
                book.author = non_blank(author);
            }
            if let Some(pages) = pages {
                book.pages = Some(pages).filter(|p| *p > 0);
            }
            if let Some(status) = status {
                book.status = status;
            }
            if notes.is_some() {
                book.notes = non_blank(notes);
            }
            book.updated_at = now;
            nest.upsert_book(book.clone())?;
            print_json(&book)?;
        }
        BookAction::List { query, status } => {
            let filter = ShelfFilter {
                query: query.unwrap_or_default(),
                status,
            };
            print_json(&filter.apply(nest.books()))?;
        }
        BookAction::Show { id, sessions } => {
            let book = nest
                .book(&id)
                .ok_or_else(|| format!("no book with id '{id}'"))?;
            let recent = nest.recent_sessions(&id, sessions);
            print_json(&json!({
                "book": book,
                "meta": book.meta_line(),
                "active": nest.now_id() == Some(id.as_str()),
                "recentSessions": recent,
            }))?;
        }
        BookAction::Remove { id } => match nest.delete_book(&id)? {
            Some(book) => print_json(&json!({ "removed": book.id, "title": book.title }))?,
            None => return Err(format!("no book with id '{id}'").into()),
        },
        BookAction::Now { id, clear } => {
            if clear {
                nest.set_active_book(None)?;
            } else if let Some(id) = id {
                if nest.book(&id).is_none() {
                    tracing::warn!(book = %id, "active book is not on the shelf");
                }
                nest.set_active_book(Some(&id))?;
            }
            match nest.active_book() {
                Some(book) => print_json(&json!({
                    "book": book,
                    "meta": book.meta_line(),
                    "lastSession": nest.recent_sessions(&book.id, 1).first(),
                }))?,
                None => print_json(&json!({ "book": null }))?,
            }
        }
        BookAction::Finish { id } => {
            nest.mark_finished(&id)?;
            print_json(&nest.book(&id))?;
        }
    }
    Ok(())
}
