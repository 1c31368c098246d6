//! Outbound run events.
//!
//! The [`BenchRunner`](super::service::BenchRunner) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log them, collect them for a test,
//! annotate a CI job, etc.

use crate::error::Error;
use crate::meter::Edge;
use crate::report::{CheckValue, Verdict};

/// Structured events emitted by the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// The run has started.
    Started { phases: usize, checks: usize },

    /// Boot handshake finished (or was skipped when `level` is None).
    Booted { level: Option<bool>, ok: bool },

    /// A phase was entered; its handshake and settle time follow.
    PhaseStarted { name: String, ready_level: Option<bool> },

    /// The phase handshake never completed.
    ReadyTimeout { phase: String, level: bool },

    /// One measurement of a check gave up waiting for an edge.
    EdgeTimeout { check: String, pin: u8, edge: Edge },

    /// A check finished with its outcome.
    CheckFinished {
        name: String,
        pin: u8,
        value: Option<CheckValue>,
        error: Option<Error>,
    },

    /// The run budget ran out; remaining checks were not run.
    BudgetExhausted { at_tick: u64 },

    /// The run finished.
    Finished {
        passed: usize,
        total: usize,
        verdict: Verdict,
    },
}
