//! Synthetic benches and recording sinks for integration tests.
//!
//! Records every run event so tests can assert on the full event history
//! without going through the logger.

use pulsecheck::app::events::RunEvent;
use pulsecheck::app::ports::{ConfigError, EventSink, PlanPort};
use pulsecheck::plan::PlanFile;
use pulsecheck::sim::{SyntheticBench, Waveform};

/// PWM period used by the servo benches, in ticks.
pub const SERVO_PERIOD: u32 = 40_000;

// ── Servo positions (high ticks) ─────────────────────────────

pub const NEUTRAL: u32 = 18_000;
pub const MINIMUM: u32 = 6_000;
pub const MAXIMUM: u32 = 30_000;

/// Servo PWM with the given high time.
pub fn servo(high: u32) -> Waveform {
    Waveform::pwm(SERVO_PERIOD - high, high)
}

/// Bench that replays the firmware's servo sweep on pins 0 and 1:
/// boot complete at 1k, then neutral / minimum / neutral / `max_high`,
/// toggling the ready line before each position.
pub fn servo_bench(max_high: u32) -> SyntheticBench {
    let mut bench = SyntheticBench::new();
    bench.at(1_000).ready(true);
    let steps = [
        (2_000, false, NEUTRAL),
        (400_000, true, MINIMUM),
        (800_000, false, NEUTRAL),
        (1_200_000, true, max_high),
    ];
    for (t, ready, high) in steps {
        bench
            .at(t)
            .ready(ready)
            .drive(0, servo(high))
            .drive(1, servo(high));
    }
    bench
}

/// Bench with the ready line high from the start.
pub fn ready_bench() -> SyntheticBench {
    let mut bench = SyntheticBench::new();
    bench.at(0).ready(true);
    bench
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<RunEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&RunEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last(&self) -> Option<&RunEvent> {
        self.events.last()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &RunEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedPlans ─────────────────────────────────────────────

/// Plan port that returns a fixed result and counts loads.
pub struct ScriptedPlans {
    pub result: Result<PlanFile, ConfigError>,
    pub loads: core::cell::Cell<u32>,
}

#[allow(dead_code)]
impl ScriptedPlans {
    pub fn failing(err: ConfigError) -> Self {
        Self {
            result: Err(err),
            loads: core::cell::Cell::new(0),
        }
    }

    pub fn serving(file: PlanFile) -> Self {
        Self {
            result: Ok(file),
            loads: core::cell::Cell::new(0),
        }
    }
}

impl PlanPort for ScriptedPlans {
    fn load(&self) -> Result<PlanFile, ConfigError> {
        self.loads.set(self.loads.get() + 1);
        self.result.clone()
    }
}
