//! Harness configuration parameters
//!
//! All tunable tick budgets for a verification run.
//! Values can be overridden per plan file; missing fields take defaults.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::meter::PulseMeter;

/// Core harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    // --- Pulse measurement ---
    /// Tick budget for each edge search in a pulse measurement
    pub max_ticks: u32,
    /// Measurements thrown away before sampling (partial-pulse guard)
    pub warmup_discards: u8,

    // --- Phases ---
    /// Ticks to wait after a phase handshake before sampling
    pub settle_ticks: u32,
    /// Tick budget for each ready handshake
    pub ready_timeout_ticks: u32,
    /// Ready level awaited once before the first phase (None = skip)
    pub boot_ready_level: Option<bool>,

    // --- Activity checks ---
    /// Maximum ticks a toggle check samples before giving up
    pub toggle_window_ticks: u32,
    /// Ticks a duty-cycle check samples
    pub duty_window_ticks: u32,

    // --- Run ---
    /// Tick budget for the whole run
    pub run_timeout_ticks: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            // Pulse measurement
            max_ticks: 300_000,
            warmup_discards: 1,

            // Phases
            settle_ticks: 10_000,
            ready_timeout_ticks: 5_000_000,
            boot_ready_level: Some(true),

            // Activity checks
            toggle_window_ticks: 50_000,
            duty_window_ticks: 4_000,

            // Run
            run_timeout_ticks: 30_000_000,
        }
    }
}

impl HarnessConfig {
    /// Reject budgets that would make every check fail or never end.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ticks == 0 {
            return Err(ConfigError::ValidationFailed("max_ticks must be non-zero"));
        }
        if self.ready_timeout_ticks == 0 {
            return Err(ConfigError::ValidationFailed(
                "ready_timeout_ticks must be non-zero",
            ));
        }
        if self.toggle_window_ticks == 0 || self.duty_window_ticks == 0 {
            return Err(ConfigError::ValidationFailed(
                "activity windows must be non-zero",
            ));
        }
        if self.run_timeout_ticks == 0 {
            return Err(ConfigError::ValidationFailed(
                "run_timeout_ticks must be non-zero",
            ));
        }
        if u64::from(self.ready_timeout_ticks) > self.run_timeout_ticks {
            return Err(ConfigError::ValidationFailed(
                "ready_timeout_ticks exceeds run_timeout_ticks",
            ));
        }
        Ok(())
    }

    /// Meter carrying this configuration's budgets.
    pub fn meter(&self) -> PulseMeter {
        PulseMeter::new(self.max_ticks, self.warmup_discards)
    }
}
