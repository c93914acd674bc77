//! Read-only snapshot links.
//!
//! A snapshot is a tiny summary of the "now reading" state, serialized to
//! JSON, base64-encoded and carried in a `#snap=` URL fragment. Opening a link
//! yields a [`SnapshotView`], which has no handle to any store.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;
use crate::nest::Nest;
use crate::shelf::{meta_line, Book};
use crate::storage::DocumentStore;

const FRAGMENT_KEY: &str = "snap=";

/// Wire shape of a snapshot. Keys are kept short so links stay short.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "t", default)]
    pub title: Option<String>,
    #[serde(rename = "a", default)]
    pub author: Option<String>,
    #[serde(rename = "s", default)]
    pub status: Option<String>,
    #[serde(rename = "p", default)]
    pub pages: Option<u32>,
    /// Minutes read in the rolling 7-day window.
    #[serde(default)]
    pub m7: Option<u64>,
    #[serde(rename = "pr", default)]
    pub prompt: Option<String>,
}

impl Snapshot {
    pub fn new(active: Option<&Book>, minutes_last_7_days: u64, prompt: Option<&str>) -> Self {
        Self {
            title: active.map(|b| b.title.clone()).filter(|t| !t.is_empty()),
            author: active.and_then(Book::author).map(str::to_string),
            status: active.map(|b| b.status.to_string()),
            pages: active.and_then(|b| b.pages).filter(|p| *p > 0),
            m7: Some(minutes_last_7_days),
            prompt: prompt.map(str::to_string),
        }
    }

    /// Capture the nest's active book, weekly minutes and prompt.
    pub fn capture<S: DocumentStore>(nest: &Nest<S>) -> Self {
        let stats = nest.stats();
        Self::new(nest.active_book(), stats.minutes_last_7_days, nest.prompt())
    }

    pub fn encode(&self) -> Result<String, ValidationError> {
        let json = serde_json::to_string(self)
            .map_err(|e| ValidationError::BadSnapshot(e.to_string()))?;
        Ok(STANDARD.encode(json.as_bytes()))
    }

    pub fn decode(encoded: &str) -> Result<Self, ValidationError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ValidationError::BadSnapshot(e.to_string()))?;
        let json =
            String::from_utf8(bytes).map_err(|e| ValidationError::BadSnapshot(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| ValidationError::BadSnapshot(e.to_string()))
    }

    /// `base_url` with its fragment replaced by `snap=<encoded>`.
    pub fn to_link(&self, base_url: &str) -> Result<String, ValidationError> {
        let mut url = Url::parse(base_url).map_err(|e| ValidationError::InvalidValue {
            field: "share.base_url".into(),
            message: e.to_string(),
        })?;
        let fragment = format!("{FRAGMENT_KEY}{}", self.encode()?);
        url.set_fragment(Some(&fragment));
        Ok(url.into())
    }

    /// Pull the snapshot out of a link. Accepts a full URL, a bare fragment
    /// (`#snap=...`), or the encoded payload alone.
    pub fn from_link(link: &str) -> Result<Self, ValidationError> {
        let link = link.trim();
        let fragment = match link.split_once('#') {
            Some((_, fragment)) => fragment,
            None => link,
        };
        let encoded = match fragment.find(FRAGMENT_KEY) {
            Some(pos) => {
                let rest = &fragment[pos + FRAGMENT_KEY.len()..];
                rest.split('&').next().unwrap_or_default()
            }
            None if link.contains('#') => {
                return Err(ValidationError::BadSnapshot("no snap= in fragment".into()))
            }
            None => fragment,
        };
        if encoded.is_empty() {
            return Err(ValidationError::BadSnapshot("empty payload".into()));
        }
        Self::decode(encoded)
    }
}

/// A decoded snapshot opened for viewing. There is nothing to mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotView {
    snapshot: Snapshot,
}

impl SnapshotView {
    pub fn open(link: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            snapshot: Snapshot::from_link(link)?,
        })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn title(&self) -> &str {
        self.snapshot
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Shared snapshot")
    }

    pub fn meta_line(&self) -> String {
        meta_line(self.snapshot.author.as_deref(), self.snapshot.pages)
    }

    pub fn chips(&self) -> Vec<String> {
        let mut chips = vec!["read-only snapshot link".to_string()];
        if let Some(status) = self.snapshot.status.as_deref().filter(|s| !s.is_empty()) {
            chips.push(format!("status: {status}"));
        }
        if let Some(m7) = self.snapshot.m7 {
            chips.push(format!("7d minutes: {m7}"));
        }
        chips
    }
}
