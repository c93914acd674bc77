//! Full JSON backup files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::storage::{reconcile, Document};

/// Identifier every backup must carry to be importable.
pub const APP_ID: &str = "sloth-reading-nest";
pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub app: String,
    pub version: u32,
    /// Epoch milliseconds.
    pub exported_at: i64,
    pub data: Document,
}

impl Backup {
    pub fn new(data: Document, exported_at: i64) -> Self {
        Self {
            app: APP_ID.to_string(),
            version: BACKUP_VERSION,
            exported_at,
            data,
        }
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Validate a backup file and reconcile its data section.
///
/// `current_minutes` stands in for a missing `timerMinutes`, so importing an
/// old file keeps the session length already configured.
pub fn parse_backup(raw: &str, current_minutes: u32) -> Result<Document, ValidationError> {
    let payload: Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    if payload.get("app").and_then(Value::as_str) != Some(APP_ID) {
        return Err(ValidationError::NotAnExport);
    }
    match payload.get("data") {
        Some(data) if data.is_object() => Ok(reconcile(data, current_minutes)),
        _ => Err(ValidationError::MissingData),
    }
}
