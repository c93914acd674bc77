//! Reading session countdown.
//!
//! The engine is a wall-clock-based state machine with no thread of its own.
//! Remaining time is always derived from `started_at`, never decremented, so
//! a late or skipped tick cannot make the countdown drift. Whoever owns the
//! engine drives `tick()` (see [`super::Ticker`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running ...
//!           |
//!           +-> Expired (left = 0) -> Running (fresh run) | Idle (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(20);
//! engine.start();
//! // On every refresh:
//! if let Some(Event::TimerExpired { .. }) = engine.tick() { /* ring */ }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use crate::events::Event;

pub const MIN_MINUTES: u32 = 5;
pub const MAX_MINUTES: u32 = 180;
pub const DEFAULT_MINUTES: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Countdown hit zero. Behaves like Idle with nothing left.
    Expired,
}

/// Clamp a requested session length to the supported range.
pub fn clamp_minutes(minutes: u32) -> u32 {
    minutes.clamp(MIN_MINUTES, MAX_MINUTES)
}

/// `MM:SS` for display; minutes are not wrapped into hours.
pub fn fmt_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Countdown engine for one reading session.
///
/// Invariant: `state == Running` exactly when `started_at_ms` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    total_sec: u32,
    left_sec: u32,
    state: TimerState,
    /// Epoch ms such that `now - started_at_ms` is the elapsed time of the
    /// whole run, including time run before a pause.
    #[serde(default)]
    started_at_ms: Option<i64>,
    #[serde(skip, default = "system_clock")]
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    /// Idle engine of `minutes` (clamped) on the system clock.
    pub fn new(minutes: u32) -> Self {
        Self::with_clock(minutes, system_clock())
    }

    pub fn with_clock(minutes: u32, clock: Arc<dyn Clock>) -> Self {
        let total_sec = clamp_minutes(minutes) * 60;
        Self {
            total_sec,
            left_sec: total_sec,
            state: TimerState::Idle,
            started_at_ms: None,
            clock,
        }
    }

    /// Swap the clock, e.g. after deserializing a persisted engine.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    /// Repair a deserialized engine so its invariants hold again.
    pub fn normalized(mut self) -> Self {
        let total_sec = clamp_minutes((self.total_sec + 30) / 60) * 60;
        if total_sec != self.total_sec {
            self.total_sec = total_sec;
            self.left_sec = total_sec;
            self.state = TimerState::Idle;
            self.started_at_ms = None;
        }
        self.left_sec = self.left_sec.min(self.total_sec);
        match (self.state, self.started_at_ms) {
            (TimerState::Running, None) => self.state = TimerState::Paused,
            (TimerState::Running, Some(_)) => {}
            (_, Some(_)) => self.started_at_ms = None,
            _ => {}
        }
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn total_sec(&self) -> u32 {
        self.total_sec
    }

    /// Remaining seconds as of the last tick/pause.
    pub fn left_sec(&self) -> u32 {
        self.left_sec
    }

    pub fn started_at_ms(&self) -> Option<i64> {
        self.started_at_ms
    }

    /// Configured length in whole minutes.
    pub fn minutes(&self) -> u32 {
        (self.total_sec + 30) / 60
    }

    /// 0.0 .. 1.0 of the configured length already read.
    pub fn progress(&self) -> f64 {
        if self.total_sec == 0 {
            return 0.0;
        }
        1.0 - (self.left_sec as f64 / self.total_sec as f64)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            total_secs: self.total_sec,
            left_secs: self.left_sec,
            display: fmt_clock(self.left_sec),
            progress_pct: (self.progress() * 100.0).clamp(0.0, 100.0),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Set a new length and hard-reset to Idle, whatever the current state.
    pub fn configure(&mut self, minutes: u32) -> Event {
        self.total_sec = clamp_minutes(minutes) * 60;
        self.left_sec = self.total_sec;
        self.state = TimerState::Idle;
        self.started_at_ms = None;
        Event::TimerConfigured {
            total_secs: self.total_sec,
            at: self.clock.now(),
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => None,
            TimerState::Idle | TimerState::Paused | TimerState::Expired => {
                if self.state == TimerState::Expired || self.left_sec == 0 {
                    self.left_sec = self.total_sec;
                }
                let now = self.clock.now_ms();
                let already_ms = i64::from(self.total_sec - self.left_sec) * 1000;
                self.started_at_ms = Some(now - already_ms);
                self.state = TimerState::Running;
                Some(Event::TimerStarted {
                    total_secs: self.total_sec,
                    left_secs: self.left_sec,
                    at: self.clock.now(),
                })
            }
        }
    }

    /// Recompute `left_sec`. Returns `TimerExpired` once, on the tick that
    /// reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed();
        if self.left_sec == 0 {
            return Some(self.expire());
        }
        None
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed();
        if self.left_sec == 0 {
            return Some(self.expire());
        }
        self.state = TimerState::Paused;
        self.started_at_ms = None;
        Some(Event::TimerPaused {
            left_secs: self.left_sec,
            at: self.clock.now(),
        })
    }

    pub fn reset(&mut self) -> Event {
        self.state = TimerState::Idle;
        self.started_at_ms = None;
        self.left_sec = self.total_sec;
        Event::TimerReset {
            total_secs: self.total_sec,
            at: self.clock.now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self) {
        if let Some(started) = self.started_at_ms {
            let elapsed_ms = self.clock.now_ms().saturating_sub(started).max(0);
            let left = (f64::from(self.total_sec) - elapsed_ms as f64 / 1000.0).round();
            self.left_sec = left.clamp(0.0, f64::from(self.total_sec)) as u32;
        }
    }

    fn expire(&mut self) -> Event {
        self.state = TimerState::Expired;
        self.started_at_ms = None;
        self.left_sec = 0;
        tracing::info!(total_secs = self.total_sec, "reading timer finished");
        Event::TimerExpired {
            total_secs: self.total_sec,
            at: self.clock.now(),
        }
    }
}
