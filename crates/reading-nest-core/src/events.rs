use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every timer state change produces an Event.
/// The CLI prints them; the foreground loop reacts to `TimerExpired`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerConfigured {
        total_secs: u32,
        at: DateTime<Utc>,
    },
    TimerStarted {
        total_secs: u32,
        left_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        left_secs: u32,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Emitted once per run.
    TimerExpired {
        total_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_secs: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        total_secs: u32,
        left_secs: u32,
        display: String,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
