//! Synthetic bench — piecewise waveforms played back tick by tick.
//!
//! [`SyntheticBench`] stands in for a simulator: each pin follows a
//! [`Waveform`], and the bench is split into [`Stage`]s that start at
//! absolute ticks.  A stage fixes the ready-line level and the waveform of
//! every pin until the next stage begins, which is enough to replay the
//! firmware-driven phase changes a plan expects.
//!
//! Waveform time restarts at zero at the start of each stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::ports::{ReadyPort, Signal, TickSource};

/// A run of ticks at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub level: bool,
    pub ticks: u32,
}

/// Level of one pin as a function of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waveform {
    segments: Vec<Segment>,
    repeat: bool,
    /// Level once a one-shot waveform has played out.
    idle: bool,
}

impl Waveform {
    pub fn constant(level: bool) -> Self {
        Self {
            segments: Vec::new(),
            repeat: false,
            idle: level,
        }
    }

    /// Play `runs` once, then hold the last level.
    pub fn once(runs: &[(bool, u32)]) -> Self {
        Self::from_runs(runs, false)
    }

    /// Play `runs` forever.
    pub fn repeating(runs: &[(bool, u32)]) -> Self {
        Self::from_runs(runs, true)
    }

    /// Square wave: `low` ticks low, then `high` ticks high, repeating.
    pub fn pwm(low: u32, high: u32) -> Self {
        Self::repeating(&[(false, low), (true, high)])
    }

    fn from_runs(runs: &[(bool, u32)], repeat: bool) -> Self {
        let segments: Vec<Segment> = runs
            .iter()
            .map(|&(level, ticks)| Segment { level, ticks })
            .collect();
        let idle = segments.last().is_some_and(|s| s.level);
        Self {
            segments,
            repeat,
            idle,
        }
    }

    fn period(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.ticks)).sum()
    }

    /// Level at `t` ticks after the waveform started.
    pub fn level_at(&self, t: u64) -> bool {
        let period = self.period();
        if period == 0 {
            return self.idle;
        }
        let mut t = if self.repeat {
            t % period
        } else if t >= period {
            return self.idle;
        } else {
            t
        };
        for seg in &self.segments {
            let len = u64::from(seg.ticks);
            if t < len {
                return seg.level;
            }
            t -= len;
        }
        self.idle
    }
}

/// Bench state from `starts_at` until the next stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    starts_at: u64,
    ready: bool,
    pins: BTreeMap<u8, Waveform>,
}

impl Stage {
    /// Set the ready-line level for this stage.
    pub fn ready(&mut self, level: bool) -> &mut Self {
        self.ready = level;
        self
    }

    /// Drive `pin` with `waveform` for this stage.
    pub fn drive(&mut self, pin: u8, waveform: Waveform) -> &mut Self {
        self.pins.insert(pin, waveform);
        self
    }

    fn level(&self, pin: u8, now: u64) -> bool {
        self.pins
            .get(&pin)
            .is_some_and(|w| w.level_at(now - self.starts_at))
    }
}

/// Staged waveform playback implementing every bench port.
#[derive(Debug, Clone)]
pub struct SyntheticBench {
    stages: Vec<Stage>,
    now: u64,
}

impl Default for SyntheticBench {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticBench {
    /// All pins low and the ready line low from tick 0.
    pub fn new() -> Self {
        Self {
            stages: vec![Stage {
                starts_at: 0,
                ready: false,
                pins: BTreeMap::new(),
            }],
            now: 0,
        }
    }

    /// Stage starting at tick `t`, created from the stage before it if
    /// needed.  Declare stages in time order: a new stage copies its
    /// predecessor as it is at the time of the call.
    pub fn at(&mut self, t: u64) -> &mut Stage {
        let idx = self.stages.partition_point(|s| s.starts_at <= t);
        // Stage 0 starts at tick 0, so idx >= 1.
        if self.stages[idx - 1].starts_at != t {
            let mut stage = self.stages[idx - 1].clone();
            stage.starts_at = t;
            self.stages.insert(idx, stage);
            return &mut self.stages[idx];
        }
        &mut self.stages[idx - 1]
    }

    fn current(&self) -> usize {
        self.stages.partition_point(|s| s.starts_at <= self.now) - 1
    }

    /// Level of the ready line right now.
    pub fn ready_level(&self) -> bool {
        self.stages[self.current()].ready
    }
}

impl Signal for SyntheticBench {
    fn read_bit(&mut self, pin: u8) -> bool {
        self.stages[self.current()].level(pin, self.now)
    }
}

impl TickSource for SyntheticBench {
    fn advance(&mut self, ticks: u32) {
        self.now += u64::from(ticks);
    }

    fn now(&self) -> u64 {
        self.now
    }
}

impl ReadyPort for SyntheticBench {
    /// Equivalent to polling once per tick; the ready line only changes at
    /// stage boundaries, so the wait jumps straight to the next match.
    fn await_ready(&mut self, level: bool, max_ticks: u32) -> bool {
        if max_ticks == 0 {
            return false;
        }
        if self.ready_level() == level {
            return true;
        }
        let cur = self.current();
        let next = self.stages[cur + 1..]
            .iter()
            .find(|s| s.ready == level)
            .map(|s| s.starts_at);
        match next {
            Some(t) if t - self.now < u64::from(max_ticks) => {
                self.now = t;
                true
            }
            _ => {
                self.now += u64::from(max_ticks);
                false
            }
        }
    }
}
