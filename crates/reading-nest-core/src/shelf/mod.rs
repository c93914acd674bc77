//! Shelf types: books, reading sessions, and shelf filtering.
//!
//! Field names serialize in camelCase so stored documents and export files
//! keep the `updatedAt` / `bookId` / `pagesRead` shape.

mod session;

pub use session::Session;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a book sits on the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookStatus {
    Reading,
    #[default]
    ToRead,
    Finished,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookStatus::Reading => write!(f, "reading"),
            BookStatus::ToRead => write!(f, "to-read"),
            BookStatus::Finished => write!(f, "finished"),
        }
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reading" => Ok(BookStatus::Reading),
            "to-read" | "toread" | "to_read" => Ok(BookStatus::ToRead),
            "finished" | "done" => Ok(BookStatus::Finished),
            other => Err(format!(
                "unknown status '{other}' (expected reading, to-read or finished)"
            )),
        }
    }
}

/// A book on the shelf.
///
/// `id` is assigned once by whoever creates the book and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub notes: Option<String>,
    /// Epoch milliseconds of the last edit.
    #[serde(default)]
    pub updated_at: i64,
}

impl Book {
    pub fn new(id: impl Into<String>, title: impl Into<String>, status: BookStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            pages: None,
            status,
            notes: None,
            updated_at: 0,
        }
    }

    /// Author if present and non-blank.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// "by Author · 320 pages", skipping the parts that are missing.
    pub fn meta_line(&self) -> String {
        meta_line(self.author(), self.pages)
    }

    fn haystack(&self) -> String {
        [Some(self.title.as_str()), self.author.as_deref(), self.notes.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// Shared by the now-reading view and the reading card.
pub fn meta_line(author: Option<&str>, pages: Option<u32>) -> String {
    let mut parts = Vec::new();
    if let Some(author) = author.filter(|a| !a.is_empty()) {
        parts.push(format!("by {author}"));
    }
    if let Some(pages) = pages.filter(|p| *p > 0) {
        parts.push(format!("{pages} pages"));
    }
    parts.join(" · ")
}

/// Status half of the shelf filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(BookStatus),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Search + status filter over the shelf. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct ShelfFilter {
    pub query: String,
    pub status: StatusFilter,
}

impl ShelfFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let StatusFilter::Only(status) = self.status {
            if book.status != status {
                return false;
            }
        }
        let q = self.query.trim().to_lowercase();
        q.is_empty() || book.haystack().contains(&q)
    }

    pub fn apply<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        books.iter().filter(|b| self.matches(b)).collect()
    }
}
