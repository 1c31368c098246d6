//! Scoreboard for named checks.
//!
//! Every plan entry produces exactly one [`CheckOutcome`], whether it ran,
//! failed, or was skipped because a handshake or the run budget failed.
//! The verdict has no partial credit: one failed check fails the run, and
//! a run with no checks at all is also a failure.

use core::fmt;

use log::{error, info};
use serde::Serialize;

use crate::error::Error;
use crate::monitor::PinActivity;

/// What a passing (or out-of-range) check observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckValue {
    /// Single pulse width in ticks.
    PulseWidth { ticks: u32 },
    /// Mean of the valid samples, and how many were valid.
    MeanPulseWidth { ticks: f64, valid: u8, taken: u8 },
    /// High/low tick counts from the activity monitor.
    Activity(PinActivity),
}

/// Result of one named check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub phase: String,
    pub pin: u8,
    /// Always `error.is_none()`.
    pub passed: bool,
    pub value: Option<CheckValue>,
    pub error: Option<Error>,
}

impl CheckOutcome {
    pub fn new(
        name: &str,
        phase: &str,
        pin: u8,
        value: Option<CheckValue>,
        error: Option<Error>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            phase: phase.to_owned(),
            pin,
            passed: error.is_none(),
            value,
            error,
        }
    }
}

/// Overall run result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASSED"),
            Self::Fail => write!(f, "FAILED"),
        }
    }
}

/// Ordered outcomes of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    outcomes: Vec<CheckOutcome>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome, logging failures as errors.
    pub fn record(&mut self, outcome: CheckOutcome) {
        match outcome.error {
            None => info!("[{}] {} PASSED", outcome.phase, outcome.name),
            Some(ref e) => error!("[{}] {} FAILED: {e}", outcome.phase, outcome.name),
        }
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Distinct pins named by failed checks, ascending.  Failures not tied
    /// to a pin (handshake and budget timeouts) are left out.
    pub fn failing_pins(&self) -> Vec<u8> {
        let mut pins: Vec<u8> = self
            .failures()
            .filter_map(|o| o.error.and_then(|e| e.pin()))
            .collect();
        pins.sort_unstable();
        pins.dedup();
        pins
    }

    pub fn verdict(&self) -> Verdict {
        if !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.passed) {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn summary(&self) -> String {
        format!("{}/{} checks passed", self.passed(), self.total())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
