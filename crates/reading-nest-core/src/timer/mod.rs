mod clock;
mod engine;
mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{
    clamp_minutes, fmt_clock, TimerEngine, TimerState, DEFAULT_MINUTES, MAX_MINUTES, MIN_MINUTES,
};
pub use ticker::{period_for_hz, Ticker};
