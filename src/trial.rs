//! Once-per-second driver for the trial countdown.
//!
//! The countdown arithmetic lives in [`Entitlement::tick`]; this module only
//! owns the tokio task that calls it. The task ends when the callback asks it
//! to, when [`TrialTimer::stop`] is called, or when the handle is dropped.
//!
//! [`Entitlement::tick`]: crate::entitlement::Entitlement::tick

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct TrialTimer {
    handle: JoinHandle<()>,
}

impl TrialTimer {
    /// Start ticking. The first call to `on_tick` happens one `period` after
    /// spawning. Must be called from within a tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
            tracing::debug!("trial timer finished");
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the countdown early.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for TrialTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
