//! Declarative check plans.
//!
//! A plan is a list of phases and a table of `{pin, name, phase, check}`
//! entries.  One generic runner executes any plan, so a new PWM test is a
//! new table rather than a new copy of the control flow.
//!
//! ```json
//! {
//!   "config": { "max_ticks": 300000 },
//!   "plan": {
//!     "phases": [ { "name": "neutral", "ready_level": false } ],
//!     "checks": [
//!       { "pin": 0, "name": "PWM0", "phase": "neutral",
//!         "check": { "kind": "pulse_width", "window": { "min": 16000, "max": 20000 } } }
//!     ]
//!   }
//! }
//! ```

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::config::HarnessConfig;
use crate::meter::{MAX_SAMPLES, ToleranceWindow};

/// Pins must be below this index.
pub const MAX_PIN: u8 = 64;

/// A step of the run, entered after an optional ready handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    /// Ready level to await on entry (None = no handshake).
    #[serde(default)]
    pub ready_level: Option<bool>,
    /// Overrides [`HarnessConfig::settle_ticks`] for this phase.
    #[serde(default)]
    pub settle_ticks: Option<u32>,
}

impl Phase {
    pub fn new(name: &str, ready_level: Option<bool>) -> Self {
        Self {
            name: name.to_owned(),
            ready_level,
            settle_ticks: None,
        }
    }
}

/// What a check measures and how it passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    /// Measure pulse width; pass if it (or the mean of `samples`) is in `window`.
    PulseWidth {
        window: ToleranceWindow,
        #[serde(default = "default_samples")]
        samples: u8,
    },
    /// Pass once the pin has been seen both high and low.
    Toggle,
    /// Count high/low ticks over the duty window; pass on both minimums.
    DutyCycle {
        #[serde(default = "default_min_level_ticks")]
        min_high_ticks: u32,
        #[serde(default = "default_min_level_ticks")]
        min_low_ticks: u32,
    },
}

fn default_samples() -> u8 {
    1
}

/// One more than the 100 ticks a level must exceed in the duty scripts.
fn default_min_level_ticks() -> u32 {
    101
}

/// One row of the check table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub pin: u8,
    pub name: String,
    /// Name of the [`Phase`] this check runs in.
    pub phase: String,
    pub check: CheckKind,
}

impl CheckEntry {
    pub fn new(pin: u8, name: &str, phase: &str, check: CheckKind) -> Self {
        Self {
            pin,
            name: name.to_owned(),
            phase: phase.to_owned(),
            check,
        }
    }
}

/// Ordered phases plus the check table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    pub phases: Vec<Phase>,
    pub checks: Vec<CheckEntry>,
}

impl TestPlan {
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Checks belonging to `phase`, in table order.
    pub fn checks_in<'a>(&'a self, phase: &'a str) -> impl Iterator<Item = &'a CheckEntry> + 'a {
        self.checks.iter().filter(move |c| c.phase == phase)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::ValidationFailed("plan has no phases"));
        }
        if self.checks.is_empty() {
            return Err(ConfigError::ValidationFailed("plan has no checks"));
        }

        for (i, phase) in self.phases.iter().enumerate() {
            if self.phases[..i].iter().any(|p| p.name == phase.name) {
                warn!("plan: phase '{}' declared twice", phase.name);
                return Err(ConfigError::ValidationFailed("duplicate phase name"));
            }
        }

        for entry in &self.checks {
            if self.phase(&entry.phase).is_none() {
                warn!(
                    "plan: check '{}' references unknown phase '{}'",
                    entry.name, entry.phase
                );
                return Err(ConfigError::ValidationFailed(
                    "check references unknown phase",
                ));
            }
            if entry.pin >= MAX_PIN {
                warn!("plan: check '{}' uses pin {}", entry.name, entry.pin);
                return Err(ConfigError::ValidationFailed("pin index out of range"));
            }
            match entry.check {
                CheckKind::PulseWidth { window, samples } => {
                    if !window.is_well_formed() {
                        return Err(ConfigError::ValidationFailed(
                            "tolerance window min exceeds max",
                        ));
                    }
                    if samples == 0 || usize::from(samples) > MAX_SAMPLES {
                        return Err(ConfigError::ValidationFailed(
                            "samples must be between 1 and 16",
                        ));
                    }
                }
                CheckKind::DutyCycle {
                    min_high_ticks,
                    min_low_ticks,
                } => {
                    if min_high_ticks == 0 && min_low_ticks == 0 {
                        return Err(ConfigError::ValidationFailed(
                            "duty check needs a non-zero threshold",
                        ));
                    }
                }
                CheckKind::Toggle => {}
            }
        }
        Ok(())
    }
}

/// On-disk form: a plan plus its (optional) harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub config: HarnessConfig,
    pub plan: TestPlan,
}

impl PlanFile {
    pub fn new(config: HarnessConfig, plan: TestPlan) -> Self {
        Self { config, plan }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        self.plan.validate()
    }

    /// Parse and validate a JSON plan document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: Self = serde_json::from_str(text).map_err(|e| {
            warn!("plan: parse error: {e}");
            ConfigError::Corrupted
        })?;
        file.validate()?;
        Ok(file)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Built-in plans
// ═══════════════════════════════════════════════════════════════

/// Servo sweep on PWM0/PWM1 (pins 0 and 1).
///
/// Firmware flips the ready line before each position change:
/// neutral (18000 ticks, ~1.5 ms) on 0, minimum (6000) on 1, neutral on 0,
/// maximum (30000) on 1.
pub fn servo_plan() -> TestPlan {
    const NEUTRAL: ToleranceWindow = ToleranceWindow::new(16_000, 20_000);
    const MINIMUM: ToleranceWindow = ToleranceWindow::new(4_000, 8_000);
    const MAXIMUM: ToleranceWindow = ToleranceWindow::new(28_000, 32_000);

    let steps = [
        ("neutral", false, NEUTRAL),
        ("minimum", true, MINIMUM),
        ("neutral_again", false, NEUTRAL),
        ("maximum", true, MAXIMUM),
    ];

    let mut plan = TestPlan::default();
    for (phase, ready, window) in steps {
        plan.phases.push(Phase::new(phase, Some(ready)));
        for pin in 0..2u8 {
            plan.checks.push(CheckEntry::new(
                pin,
                &format!("PWM{pin}"),
                phase,
                CheckKind::PulseWidth { window, samples: 1 },
            ));
        }
    }
    plan
}

/// Single phase toggle check for `count` consecutive PWM outputs.
pub fn toggle_bank_plan(first_pin: u8, count: u8) -> TestPlan {
    let mut plan = TestPlan {
        phases: vec![Phase::new("toggle", None)],
        checks: Vec::new(),
    };
    for i in 0..count {
        plan.checks.push(CheckEntry::new(
            first_pin.saturating_add(i),
            &format!("PWM{i}"),
            "toggle",
            CheckKind::Toggle,
        ));
    }
    plan
}
