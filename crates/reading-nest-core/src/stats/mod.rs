//! Reading statistics.
//!
//! Pure projections over the session history, recomputed on every call.

use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};

use crate::shelf::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadingStats {
    /// Sessions logged on `now`'s calendar date, in `now`'s zone.
    pub minutes_today: u64,
    /// Sessions logged less than 7×24h before `now`.
    pub minutes_last_7_days: u64,
    pub session_count: usize,
}

impl ReadingStats {
    pub fn compute<Tz: TimeZone>(sessions: &[Session], now: &DateTime<Tz>) -> Self {
        let now_ms = now.timestamp_millis();
        let week_ms = Duration::days(7).num_milliseconds();
        let today = now.date_naive();
        let tz = now.timezone();

        let mut stats = Self {
            session_count: sessions.len(),
            ..Self::default()
        };
        for s in sessions {
            let minutes = u64::from(s.minutes);
            if now_ms.saturating_sub(s.at) < week_ms {
                stats.minutes_last_7_days += minutes;
            }
            if s.at_in(&tz).date_naive() == today {
                stats.minutes_today += minutes;
            }
        }
        stats
    }
}
