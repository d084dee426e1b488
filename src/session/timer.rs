//! Planning-phase countdown.
//!
//! The timer owns its `tokio::time::Interval`, so stopping it drops the clock
//! and no stale tick can be observed afterwards.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Event produced once per elapsed second while the timer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second elapsed; carries the new remaining value (> 0)
    Tick(u32),
    /// Remaining time reached zero; the timer has stopped itself
    Expired,
}

/// Countdown clock that fires [`TimerEvent::Expired`] exactly once at zero
#[derive(Debug, Default)]
pub struct PhaseTimer {
    remaining: u32,
    interval: Option<Interval>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `seconds`, replacing any running countdown
    pub fn start(&mut self, seconds: u32) {
        self.stop();

        let period = Duration::from_secs(1);
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.remaining = seconds;
        self.interval = Some(interval);
        debug!("Phase timer started at {}", format_clock(seconds));
    }

    /// Cancel the countdown. Safe to call when not running.
    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            debug!("Phase timer stopped at {}", format_clock(self.remaining));
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Wait for the next second to elapse.
    ///
    /// Never resolves while the timer is stopped. Cancel safe.
    pub async fn next_event(&mut self) -> TimerEvent {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                self.advance()
            }
            None => std::future::pending().await,
        }
    }

    fn advance(&mut self) -> TimerEvent {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.interval = None;
            TimerEvent::Expired
        } else {
            TimerEvent::Tick(self.remaining)
        }
    }
}

/// Format seconds as `M:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
