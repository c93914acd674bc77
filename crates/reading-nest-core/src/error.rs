//! Core error types for reading-nest-core.
//!
//! The hierarchy mirrors how each failure is handled: precondition and
//! validation failures block the action and are shown to the user, storage
//! failures bubble up from SQLite, and corrupt stored documents never show up
//! here at all (they are reconciled on load).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for reading-nest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The action needs state that is not there yet.
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// Input was rejected before any state changed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// PNG encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Card drawing errors
    #[error("Render error: {0}")]
    Render(String),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Actions that cannot run in the current state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreconditionError {
    /// No "now reading" book is set, or it no longer resolves.
    #[error("Pick a \"now reading\" book first")]
    NoActiveBook,

    /// The book id is not on the shelf.
    #[error("No book with id '{0}'")]
    UnknownBook(String),
}

/// Input rejected before any state change.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Import payload is not JSON at all.
    #[error("Import file is not valid JSON: {0}")]
    MalformedJson(String),

    /// Import payload lacks the app identifier.
    #[error("Not a Sloth Reading Nest export")]
    NotAnExport,

    /// Import payload has the identifier but no data object.
    #[error("Export file has no data section")]
    MissingData,

    /// A required field is empty.
    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    /// Snapshot link cannot be decoded.
    #[error("Invalid snapshot link: {0}")]
    BadSnapshot(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Data directory could not be created
    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
