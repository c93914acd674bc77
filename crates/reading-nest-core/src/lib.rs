//! # Reading Nest Core Library
//!
//! This library provides the core logic for Reading Nest, a small offline
//! reading tracker. Everything is available through the `reading-nest` CLI,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Nest**: the single owner of the shelf, session history, prompt and
//!   timer. Every mutation persists itself before returning.
//! - **Timer Engine**: a wall-clock countdown that the caller drives with
//!   `tick()`, usually from a cancellable [`Ticker`]
//! - **Storage**: one JSON document in a SQLite key-value slot, reconciled
//!   field by field on load, plus TOML configuration
//! - **Exports**: JSON backup, session CSV, reading card PNG, share links
//!
//! ## Key Components
//!
//! - [`Nest`]: domain state and mutation entry points
//! - [`TimerEngine`]: countdown state machine
//! - [`Database`]: persistence
//! - [`Config`]: application configuration management

pub mod card;
pub mod error;
pub mod events;
pub mod export;
pub mod nest;
pub mod offline;
pub mod prompt;
pub mod share;
pub mod shelf;
pub mod stats;
pub mod storage;
pub mod timer;

pub use card::CardContent;
pub use error::{ConfigError, CoreError, PreconditionError, StorageError, ValidationError};
pub use events::Event;
pub use export::Backup;
pub use nest::{ImportSummary, Nest};
pub use share::{Snapshot, SnapshotView};
pub use shelf::{Book, BookStatus, Session, ShelfFilter};
pub use stats::ReadingStats;
pub use storage::{Config, Database, Document, DocumentStore, MemoryStore};
pub use timer::{Clock, SystemClock, Ticker, TimerEngine, TimerState};
