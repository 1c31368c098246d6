//! Unified error types for the pulse-check harness.
//!
//! A single `Error` enum that every check outcome can carry, keeping the
//! runner's aggregation uniform.  All variants are `Copy` so they can be
//! stored in reports and passed through event sinks without allocation.
//!
//! None of these abort a run.  The meter and monitor return them as values;
//! only the top-level driver turns a failed verdict into a fatal error.

use core::fmt;

use serde::Serialize;

use crate::meter::{Edge, ToleranceWindow};

// ---------------------------------------------------------------------------
// Top-level harness error
// ---------------------------------------------------------------------------

/// Every failed check funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Error {
    /// A rising or falling edge was not observed within the tick budget.
    EdgeTimeout { pin: u8, edge: Edge },
    /// A valid duration fell outside its tolerance window.
    OutOfRange {
        pin: u8,
        duration: u32,
        window: ToleranceWindow,
    },
    /// Every sample in a sample set was invalid; nothing to average.
    NoValidSamples { pin: u8 },
    /// The pin was not seen spending enough ticks at both levels.
    NotToggling {
        pin: u8,
        high_ticks: u32,
        low_ticks: u32,
    },
    /// The ready line never reached the requested level.
    ReadyTimeout { level: bool },
    /// The run-wide tick budget expired before the check could run.
    RunTimeout { budget: u64 },
}

impl Error {
    /// Pin the failure refers to, if any.
    pub fn pin(&self) -> Option<u8> {
        match *self {
            Self::EdgeTimeout { pin, .. }
            | Self::OutOfRange { pin, .. }
            | Self::NoValidSamples { pin }
            | Self::NotToggling { pin, .. } => Some(pin),
            Self::ReadyTimeout { .. } | Self::RunTimeout { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdgeTimeout { pin, edge } => {
                write!(f, "pin {pin}: timed out waiting for {edge} edge")
            }
            Self::OutOfRange {
                pin,
                duration,
                window,
            } => write!(
                f,
                "pin {pin}: pulse width {duration} ticks outside {window}"
            ),
            Self::NoValidSamples { pin } => write!(f, "pin {pin}: no valid pulse measurements"),
            Self::NotToggling {
                pin,
                high_ticks,
                low_ticks,
            } => write!(
                f,
                "pin {pin}: not toggling ({high_ticks} high, {low_ticks} low)"
            ),
            Self::ReadyTimeout { level } => {
                write!(f, "ready line never reached {}", u8::from(*level))
            }
            Self::RunTimeout { budget } => write!(f, "run budget of {budget} ticks exhausted"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Harness-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
