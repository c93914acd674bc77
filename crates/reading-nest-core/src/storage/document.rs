//! The persisted reading document and its tolerant loader.
//!
//! Whatever sits in the storage slot is turned into a valid [`Document`]
//! field by field: a bad `books` array does not cost the sessions, a bad
//! book does not cost the other books, and a bad page count does not cost
//! the book. Nothing here ever fails on content. Only the storage backend itself can return an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};

use crate::error::{Result, StorageError};
use crate::shelf::{Book, BookStatus, Session};
use crate::timer::{clamp_minutes, DEFAULT_MINUTES};

/// Fixed, namespaced key of the document slot.
pub const DOCUMENT_KEY: &str = "sloth-reading-nest:v1";

/// Everything that survives a restart, written as one blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub books: Vec<Book>,
    /// Newest first.
    pub sessions: Vec<Session>,
    pub now_id: Option<String>,
    pub prompt: Option<String>,
    pub timer_minutes: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty(DEFAULT_MINUTES)
    }
}

impl Document {
    pub fn empty(timer_minutes: u32) -> Self {
        Self {
            books: Vec::new(),
            sessions: Vec::new(),
            now_id: None,
            prompt: None,
            timer_minutes: clamp_minutes(timer_minutes),
        }
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    /// The "now reading" book, if the pointer resolves.
    pub fn active_book(&self) -> Option<&Book> {
        self.now_id.as_deref().and_then(|id| self.book(id))
    }

    /// With no "now reading" pointer set, point it at the first book being
    /// read. Returns whether the pointer changed.
    pub fn adopt_first_reading(&mut self) -> bool {
        if self.now_id.is_some() {
            return false;
        }
        self.now_id = self
            .books
            .iter()
            .find(|b| b.status == BookStatus::Reading)
            .map(|b| b.id.clone());
        self.now_id.is_some()
    }
}

/// Build a valid document from any JSON value.
///
/// `default_minutes` is used when the value carries no usable
/// `timerMinutes`.
pub fn reconcile(value: &Value, default_minutes: u32) -> Document {
    let Some(obj) = value.as_object() else {
        tracing::warn!("stored document is not a JSON object; starting fresh");
        return Document::empty(default_minutes);
    };
    Document {
        books: list_field(obj, "books", book_entry),
        sessions: list_field(obj, "sessions", session_entry),
        now_id: string_field(obj, "nowId"),
        prompt: string_field(obj, "prompt"),
        timer_minutes: timer_minutes(obj.get("timerMinutes"))
            .unwrap_or_else(|| clamp_minutes(default_minutes)),
    }
}

fn list_field<T>(
    obj: &Map<String, Value>,
    field: &str,
    entry: fn(&Map<String, Value>) -> Option<T>,
) -> Vec<T> {
    match obj.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let parsed = item.as_object().and_then(entry);
                if parsed.is_none() {
                    tracing::warn!(field, index, "dropping entry without its identity fields");
                }
                parsed
            })
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            tracing::warn!(field, "expected an array; using an empty list");
            Vec::new()
        }
    }
}

/// A book needs a non-empty `id`; every other field falls back on its own.
fn book_entry(obj: &Map<String, Value>) -> Option<Book> {
    let id = id_field(obj, "id")?;
    let status = match obj.get("status") {
        Some(Value::String(s)) => s.parse().unwrap_or_else(|_| {
            tracing::warn!(book = %id, status = %s, "unknown status; using to-read");
            BookStatus::default()
        }),
        _ => BookStatus::default(),
    };
    Some(Book {
        title: text(obj, "title").unwrap_or_default(),
        author: text(obj, "author"),
        pages: count(obj, "pages"),
        status,
        notes: text(obj, "notes"),
        updated_at: millis(obj, "updatedAt").unwrap_or(0),
        id,
    })
}

/// A session needs `id`, `bookId` and `at`; the rest is optional.
fn session_entry(obj: &Map<String, Value>) -> Option<Session> {
    Some(Session {
        id: id_field(obj, "id")?,
        at: millis(obj, "at")?,
        book_id: id_field(obj, "bookId")?,
        minutes: count(obj, "minutes").unwrap_or(0),
        pages_read: count(obj, "pagesRead"),
        mood_after: text(obj, "moodAfter"),
    })
}

fn id_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Finite number (or numeric string), rounded.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then(|| n.round())
}

/// Non-negative whole count; anything else reads as absent.
fn count(obj: &Map<String, Value>, field: &str) -> Option<u32> {
    let value = obj.get(field)?;
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    match number(value) {
        Some(n) if (0.0..=f64::from(u32::MAX)).contains(&n) => Some(n as u32),
        Some(n) => {
            tracing::warn!(field, value = n, "count out of range; ignoring");
            None
        }
        None => None,
    }
}

fn millis(obj: &Map<String, Value>, field: &str) -> Option<i64> {
    let value = obj.get(field)?;
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    number(value)
        .filter(|n| (i64::MIN as f64..=i64::MAX as f64).contains(n))
        .map(|n| n as i64)
}

fn string_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => None,
        Some(_) => {
            tracing::warn!(field, "expected a string; ignoring");
            None
        }
    }
}

/// Usable minutes: a non-zero finite number (or numeric string), clamped.
fn timer_minutes(value: Option<&Value>) -> Option<u32> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() || raw == 0.0 {
        return None;
    }
    let rounded = raw.round().clamp(0.0, f64::from(u32::MAX)) as u32;
    Some(clamp_minutes(rounded))
}

/// A single key-value slot that holds the serialized document.
pub trait DocumentStore {
    fn read_blob(&self) -> Result<Option<String>, StorageError>;
    fn write_blob(&self, blob: &str) -> Result<(), StorageError>;

    /// Read and reconcile. Missing or corrupt content yields an empty
    /// document; only backend failures are errors.
    fn load(&self, default_minutes: u32) -> Result<Document, StorageError> {
        let Some(raw) = self.read_blob()? else {
            tracing::debug!("no stored document; first run");
            return Ok(Document::empty(default_minutes));
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Ok(reconcile(&value, default_minutes)),
            Err(e) => {
                tracing::warn!(error = %e, "stored document is not valid JSON; starting fresh");
                Ok(Document::empty(default_minutes))
            }
        }
    }

    /// Replace the stored snapshot in one write.
    fn save(&self, doc: &Document) -> Result<()> {
        let blob = serde_json::to_string(doc)?;
        self.write_blob(&blob)?;
        tracing::debug!(
            books = doc.books.len(),
            sessions = doc.sessions.len(),
            "saved document"
        );
        Ok(())
    }
}

/// In-process slot, for tests and throwaway views.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: RefCell<Option<String>>,
    refuse_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RefCell::new(Some(blob.into())),
            refuse_writes: Cell::new(false),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.borrow().clone()
    }

    /// Make every following write fail, to exercise error paths.
    pub fn refuse_writes(&self, refuse: bool) {
        self.refuse_writes.set(refuse);
    }
}

impl DocumentStore for MemoryStore {
    fn read_blob(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob.borrow().clone())
    }

    fn write_blob(&self, blob: &str) -> Result<(), StorageError> {
        if self.refuse_writes.get() {
            return Err(StorageError::QueryFailed("write refused".into()));
        }
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}
