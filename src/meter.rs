//! Cycle-accurate pulse-width measurement.
//!
//! The meter samples one pin once per tick and measures how long it stays
//! high during a single pulse.  Two bounded loops run back to back:
//!
//! 1. **Rising-edge search** — advance until the pin reads 1.
//! 2. **High-duration count** — count ticks until the pin reads 0.
//!
//! Each loop has its own tick budget and its own failure mode, so "no
//! activity at all" and "stuck high" surface as different [`Edge`]s on an
//! invalid [`Measurement`].
//!
//! ## Partial pulses
//!
//! The pin's phase is unknown when measurement starts.  If it is already
//! high, the rising-edge search returns immediately and the count covers
//! only the tail of the pulse.  [`PulseMeter::sample`] discards a
//! configurable number of warm-up measurements before keeping any.
//!
//! No state survives between calls: every function here is a pure function
//! of the tick-by-tick trace the bench presents.

use core::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Signal, TickSource};
use crate::error::{Error, Result};

/// Upper bound on measurements kept in one [`SampleSet`].
pub const MAX_SAMPLES: usize = 16;

// ═══════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════

/// Which edge a bounded search was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Rising,
    Falling,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
        }
    }
}

/// Result of one measurement.
///
/// A duration of 0 is reserved for "no valid pulse"; every valid
/// measurement has a duration of at least one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Measurement {
    pub pin: u8,
    /// High time in ticks (0 when invalid).
    pub duration: u32,
    /// The edge whose search ran out of budget, if any.
    pub timed_out: Option<Edge>,
}

impl Measurement {
    /// A complete pulse of `duration` ticks.
    pub const fn pulse(pin: u8, duration: u32) -> Self {
        Self {
            pin,
            duration,
            timed_out: None,
        }
    }

    /// No trustworthy pulse: the search for `edge` ran out of ticks.
    pub const fn timed_out(pin: u8, edge: Edge) -> Self {
        Self {
            pin,
            duration: 0,
            timed_out: Some(edge),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.timed_out.is_none()
    }

    /// The timeout as an [`Error`], if this measurement is invalid.
    pub fn error(&self) -> Option<Error> {
        self.timed_out.map(|edge| Error::EdgeTimeout { pin: self.pin, edge })
    }
}

/// Inclusive `[min, max]` range a pulse duration must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceWindow {
    pub min: u32,
    pub max: u32,
}

impl ToleranceWindow {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Window of `nominal ± tolerance`, saturating at the integer bounds.
    pub const fn around(nominal: u32, tolerance: u32) -> Self {
        Self {
            min: nominal.saturating_sub(tolerance),
            max: nominal.saturating_add(tolerance),
        }
    }

    pub fn contains(&self, ticks: u32) -> bool {
        self.min <= ticks && ticks <= self.max
    }

    pub fn is_well_formed(&self) -> bool {
        self.min <= self.max
    }
}

impl fmt::Display for ToleranceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Ordered measurements collected for one pin in one phase.
pub type SampleSet = heapless::Vec<Measurement, MAX_SAMPLES>;

// ═══════════════════════════════════════════════════════════════
//  Measurement protocol
// ═══════════════════════════════════════════════════════════════

/// Advance tick by tick until `pin` reads `level`, for at most `max_ticks`
/// samples.  Does not advance past the tick where the level was seen.
pub fn wait_for_level<B>(bench: &mut B, pin: u8, level: bool, max_ticks: u32) -> bool
where
    B: Signal + TickSource + ?Sized,
{
    for _ in 0..max_ticks {
        if bench.read_bit(pin) == level {
            return true;
        }
        bench.advance(1);
    }
    false
}

/// Synchronise to the next clock edge, then advance until `pin` reads 1 or
/// `max_ticks` samples have been taken.  Returns whether the pin went high.
pub fn await_rising_edge<B>(bench: &mut B, pin: u8, max_ticks: u32) -> bool
where
    B: Signal + TickSource + ?Sized,
{
    bench.advance(1);
    wait_for_level(bench, pin, true, max_ticks)
}

/// Measure the high time of the next pulse on `pin`.
///
/// Both the rising-edge search and the high-time count are bounded by
/// `max_ticks`.  A pulse that never ends is reported as a falling-edge
/// timeout with duration 0, not as a long pulse.
pub fn measure_pulse<B>(bench: &mut B, pin: u8, max_ticks: u32) -> Measurement
where
    B: Signal + TickSource + ?Sized,
{
    if !await_rising_edge(bench, pin, max_ticks) {
        debug!("pin {pin}: no rising edge within {max_ticks} ticks");
        return Measurement::timed_out(pin, Edge::Rising);
    }

    let mut high_ticks = 0u32;
    for _ in 0..max_ticks {
        if !bench.read_bit(pin) {
            return Measurement::pulse(pin, high_ticks);
        }
        high_ticks += 1;
        bench.advance(1);
    }

    debug!("pin {pin}: still high after {max_ticks} ticks");
    Measurement::timed_out(pin, Edge::Falling)
}

/// True iff the measurement is valid and its duration lies in `window`.
pub fn classify(measurement: &Measurement, window: &ToleranceWindow) -> bool {
    measurement.is_valid() && window.contains(measurement.duration)
}

/// [`classify`] with the reason for a failure attached.
pub fn check(measurement: &Measurement, window: &ToleranceWindow) -> Result<u32> {
    if let Some(err) = measurement.error() {
        return Err(err);
    }
    if window.contains(measurement.duration) {
        Ok(measurement.duration)
    } else {
        Err(Error::OutOfRange {
            pin: measurement.pin,
            duration: measurement.duration,
            window: *window,
        })
    }
}

/// Mean duration of the valid measurements; `None` if there are none.
pub fn average_of(samples: &[Measurement]) -> Option<f64> {
    let (sum, count) = samples
        .iter()
        .filter(|m| m.is_valid())
        .fold((0u64, 0u32), |(sum, n), m| (sum + u64::from(m.duration), n + 1));

    if count == 0 {
        None
    } else {
        Some(sum as f64 / f64::from(count))
    }
}

// ═══════════════════════════════════════════════════════════════
//  PulseMeter
// ═══════════════════════════════════════════════════════════════

/// Measurement protocol with its budgets fixed: per-edge tick budget and
/// the number of warm-up measurements thrown away before sampling.
#[derive(Debug, Clone, Copy)]
pub struct PulseMeter {
    max_ticks: u32,
    warmup_discards: u8,
}

impl PulseMeter {
    pub const fn new(max_ticks: u32, warmup_discards: u8) -> Self {
        Self {
            max_ticks,
            warmup_discards,
        }
    }

    pub const fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    pub fn measure<B>(&self, bench: &mut B, pin: u8) -> Measurement
    where
        B: Signal + TickSource + ?Sized,
    {
        measure_pulse(bench, pin, self.max_ticks)
    }

    /// Warm up, then collect `count` measurements (capped at
    /// [`MAX_SAMPLES`]).
    pub fn sample<B>(&self, bench: &mut B, pin: u8, count: usize) -> SampleSet
    where
        B: Signal + TickSource + ?Sized,
    {
        for _ in 0..self.warmup_discards {
            let discarded = self.measure(bench, pin);
            debug!("pin {pin}: warm-up measurement {:?} discarded", discarded);
        }

        if count > MAX_SAMPLES {
            warn!("pin {pin}: {count} samples requested, capping at {MAX_SAMPLES}");
        }

        (0..count.min(MAX_SAMPLES))
            .map(|_| self.measure(&mut *bench, pin))
            .collect()
    }
}
