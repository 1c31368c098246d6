//! Run-wide tick watchdog.
//!
//! Bounds the whole run by simulated time rather than wall-clock time.
//! The runner consults it between checks; once it has expired, every
//! remaining check is failed without touching the bench.

use log::error;

pub struct TickWatchdog {
    started_at: u64,
    budget: u64,
    tripped: bool,
}

impl TickWatchdog {
    /// Arm with `budget` ticks, counted from bench time `now`.
    pub fn new(now: u64, budget: u64) -> Self {
        Self {
            started_at: now,
            budget,
            tripped: false,
        }
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.budget
            .saturating_sub(now.saturating_sub(self.started_at))
    }

    /// True once the budget is spent.  Logs the first expiry only.
    pub fn expired(&mut self, now: u64) -> bool {
        if self.remaining(now) == 0 {
            if !self.tripped {
                error!(
                    "Watchdog: run budget of {} ticks exhausted at tick {}",
                    self.budget, now
                );
                self.tripped = true;
            }
            true
        } else {
            false
        }
    }
}
