//! Port traits — the hexagonal boundary between the check logic and the bench.
//!
//! ```text
//!   Bench adapter ──▶ Port trait ──▶ PulseMeter / BenchRunner (domain)
//! ```
//!
//! Driven adapters (simulator hooks, real GPIO, event sinks, plan storage)
//! implement these traits.  The [`BenchRunner`](super::service::BenchRunner)
//! consumes them via generics, so the check logic never touches a simulator
//! directly.
//!
//! ## Tick ownership
//!
//! Exactly one party advances time.  Drivers take the bench as
//! `&mut (impl Signal + TickSource)` so the borrow checker enforces that
//! reads and advances are serialised through a single owner.

use crate::plan::PlanFile;

// ───────────────────────────────────────────────────────────────
// Signal port (driven adapter: bench → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain samples pin levels through this.
///
/// All reads made between two [`TickSource::advance`] calls observe the
/// same simulated instant.
pub trait Signal {
    /// Current level of a single pin.
    fn read_bit(&mut self, pin: u8) -> bool;

    /// Current value of the pin range `hi..=lo`, with pin `lo` in bit 0.
    ///
    /// At most 64 pins wide; wider ranges are truncated to the low 64.
    fn read_bits(&mut self, hi: u8, lo: u8) -> u64 {
        let (hi, lo) = if hi >= lo { (hi, lo) } else { (lo, hi) };
        let width = (hi - lo).min(63);
        let mut value = 0u64;
        for offset in 0..=width {
            if self.read_bit(lo + offset) {
                value |= 1 << offset;
            }
        }
        value
    }
}

// ───────────────────────────────────────────────────────────────
// Tick port (driven adapter: domain → bench clock)
// ───────────────────────────────────────────────────────────────

/// Time-advance port.  Each call is a suspension point where the bench
/// moves global time forward before control returns.
pub trait TickSource {
    /// Advance the bench clock by `ticks` clock edges.
    fn advance(&mut self, ticks: u32);

    /// Ticks elapsed since the bench started.
    fn now(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Ready handshake port (driven adapter: firmware status → domain)
// ───────────────────────────────────────────────────────────────

/// Firmware-ready handshake.  Firmware under test signals progress through
/// a status line; the harness waits for it before sampling.
pub trait ReadyPort {
    /// Advance until the ready line reads `level`, for at most `max_ticks`.
    /// Returns whether the level was reached.
    fn await_ready(&mut self, level: bool, max_ticks: u32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / reporting)
// ───────────────────────────────────────────────────────────────

/// The runner emits structured [`RunEvent`](super::events::RunEvent)s
/// through this port.  Adapters decide where they go (log, file, CI
/// annotations, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::RunEvent);
}

// ───────────────────────────────────────────────────────────────
// Plan port (driven adapter: domain ↔ persisted plan)
// ───────────────────────────────────────────────────────────────

/// Loads a check plan together with its harness configuration.
///
/// Implementations MUST validate before returning.  Invalid plans are
/// rejected with [`ConfigError::ValidationFailed`], never silently patched.
pub trait PlanPort {
    fn load(&self) -> Result<PlanFile, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`PlanPort`] operations and config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No plan found at the configured location.
    NotFound,
    /// Stored plan failed to deserialize.
    Corrupted,
    /// A field failed range or consistency validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "plan not found"),
            Self::Corrupted => write!(f, "plan corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
