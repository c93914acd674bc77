use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One logged reading interval. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Epoch milliseconds when the session was logged.
    pub at: i64,
    pub book_id: String,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub pages_read: Option<u32>,
    #[serde(default)]
    pub mood_after: Option<String>,
}

impl Session {
    pub fn at_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.at)
            .single()
            .unwrap_or_default()
    }

    /// The logged instant in the given zone.
    pub fn at_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        self.at_utc().with_timezone(tz)
    }
}
