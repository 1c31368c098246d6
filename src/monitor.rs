//! Multi-pin activity monitor.
//!
//! A cheaper check than pulse-width measurement: sample a set of pins in a
//! single tick loop and count how many ticks each spends high and low.
//! Every pin is read at the same simulated instant before time advances,
//! so the counts for different pins are directly comparable.
//!
//! Two stop policies exist:
//!
//! - [`StopPolicy::AllToggled`] — end as soon as every pin has been seen at
//!   both levels (stuck-at detection).
//! - [`StopPolicy::FullWindow`] — always sample the whole window (duty
//!   cycle estimation).

use log::debug;
use serde::Serialize;

use crate::app::ports::{Signal, TickSource};
use crate::error::{Error, Result};

/// Upper bound on pins observed by one monitor pass.
pub const MAX_PINS: usize = 64;

/// When an observation pass ends early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    FullWindow,
    AllToggled,
}

/// Tick counts for one pin over an observation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinActivity {
    pub pin: u8,
    pub high_ticks: u32,
    pub low_ticks: u32,
}

impl PinActivity {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            high_ticks: 0,
            low_ticks: 0,
        }
    }

    fn record(&mut self, level: bool) {
        if level {
            self.high_ticks += 1;
        } else {
            self.low_ticks += 1;
        }
    }

    /// Seen at both levels at least once.
    pub fn toggled(&self) -> bool {
        self.high_ticks > 0 && self.low_ticks > 0
    }

    /// Percentage of observed ticks spent high; `None` if nothing was sampled.
    pub fn duty_percent(&self) -> Option<f32> {
        let total = self.high_ticks + self.low_ticks;
        if total == 0 {
            None
        } else {
            Some(self.high_ticks as f32 / total as f32 * 100.0)
        }
    }

    /// Pass iff the pin spent at least the given ticks at each level.
    /// A zero minimum places no requirement on that level.
    pub fn check(&self, min_high_ticks: u32, min_low_ticks: u32) -> Result<Self> {
        if self.high_ticks >= min_high_ticks && self.low_ticks >= min_low_ticks {
            Ok(*self)
        } else {
            Err(Error::NotToggling {
                pin: self.pin,
                high_ticks: self.high_ticks,
                low_ticks: self.low_ticks,
            })
        }
    }
}

/// Outcome of one observation pass.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    pub pins: heapless::Vec<PinActivity, MAX_PINS>,
    /// Ticks actually sampled (less than the window on early exit).
    pub ticks_observed: u32,
}

impl Activity {
    pub fn get(&self, pin: u8) -> Option<&PinActivity> {
        self.pins.iter().find(|a| a.pin == pin)
    }

    pub fn all_toggled(&self) -> bool {
        self.pins.iter().all(PinActivity::toggled)
    }
}

/// `(hi, lo)` when the observed pins form one contiguous bank of at least
/// two pins, so a tick can be sampled with a single bus read.
fn contiguous_bank(pins: &[PinActivity]) -> Option<(u8, u8)> {
    let lo = pins.iter().map(|a| a.pin).min()?;
    let hi = pins.iter().map(|a| a.pin).max()?;
    // Pins are distinct, so a span equal to the count has no gaps.
    (pins.len() > 1 && usize::from(hi - lo) + 1 == pins.len()).then_some((hi, lo))
}

/// Sample `pins` once per tick for up to `window_ticks` ticks.
///
/// Each tick advances first, then reads every pin.  A contiguous bank is
/// read with one [`Signal::read_bits`] call per tick.  Duplicate pins are
/// observed once; pins beyond [`MAX_PINS`] are ignored.
pub fn observe<B>(bench: &mut B, pins: &[u8], window_ticks: u32, stop: StopPolicy) -> Activity
where
    B: Signal + TickSource + ?Sized,
{
    let mut activity = Activity::default();
    for &pin in pins {
        if activity.get(pin).is_none() && activity.pins.push(PinActivity::new(pin)).is_err() {
            debug!("monitor: pin {pin} dropped, more than {MAX_PINS} pins");
        }
    }

    if activity.pins.is_empty() {
        return activity;
    }

    let bank = contiguous_bank(&activity.pins);

    for _ in 0..window_ticks {
        bench.advance(1);
        activity.ticks_observed += 1;

        match bank {
            Some((hi, lo)) => {
                let word = bench.read_bits(hi, lo);
                for entry in activity.pins.iter_mut() {
                    entry.record((word >> (entry.pin - lo)) & 1 == 1);
                }
            }
            None => {
                for entry in activity.pins.iter_mut() {
                    let level = bench.read_bit(entry.pin);
                    entry.record(level);
                }
            }
        }

        if stop == StopPolicy::AllToggled && activity.all_toggled() {
            debug!(
                "monitor: all {} pins toggled after {} ticks",
                activity.pins.len(),
                activity.ticks_observed
            );
            break;
        }
    }

    activity
}
