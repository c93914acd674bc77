//! Cancellable periodic recompute task.
//!
//! A [`Ticker`] spawns one tokio task that fires on a fixed period and
//! forwards each beat over a bounded channel. The handle owns the task:
//! `cancel()` or dropping the handle stops it, so a discarded timer can never
//! leave a recurring callback behind.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Refresh period for a given rate, bounded to 1..=120 Hz.
pub fn period_for_hz(hz: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(hz.clamp(1, 120)))
}

pub struct Ticker {
    token: CancellationToken,
    beats: mpsc::Receiver<()>,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start beating every `period`. Must be called inside a tokio runtime.
    pub fn spawn(period: Duration) -> Self {
        let token = CancellationToken::new();
        let (tx, beats) = mpsc::channel(1);
        let child = token.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(()).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("ticker stopped");
        });
        Self {
            token,
            beats,
            task: Some(task),
        }
    }

    /// Wait for the next beat. `false` once cancelled.
    pub async fn next(&mut self) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            beat = self.beats.recv() => beat.is_some(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A token that observes (and can trigger) this ticker's cancellation.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel and wait for the task to wind down.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
