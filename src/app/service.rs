//! Bench runner — the hexagonal core.
//!
//! [`BenchRunner`] owns a validated plan and its configuration and runs
//! them against any bench that satisfies the port traits.  All I/O flows
//! through ports injected at call sites, making the whole run testable
//! against synthetic waveforms.
//!
//! ```text
//!   Signal ─────▶ ┌────────────────────────┐ ──▶ EventSink
//!   TickSource ◀──│      BenchRunner        │
//!   ReadyPort ◀───│ Meter · Monitor · Report│ ──▶ Report
//!                 └────────────────────────┘
//! ```
//!
//! Nothing in here aborts a run.  Timeouts and out-of-range results are
//! recorded as failed checks; only [`drive`] turns a failed verdict into
//! an error.

use anyhow::{Context, bail};
use log::{info, warn};

use crate::config::HarnessConfig;
use crate::error::Error;
use crate::meter::{self, PulseMeter, ToleranceWindow};
use crate::monitor::{self, PinActivity, StopPolicy};
use crate::plan::{CheckEntry, CheckKind, Phase, PlanFile, TestPlan};
use crate::report::{CheckOutcome, CheckValue, Report, Verdict};
use crate::watchdog::TickWatchdog;

use super::events::RunEvent;
use super::ports::{EventSink, PlanPort, ReadyPort, Signal, TickSource};

// ───────────────────────────────────────────────────────────────
// BenchRunner
// ───────────────────────────────────────────────────────────────

/// Executes a check plan phase by phase.
#[derive(Debug, Clone)]
pub struct BenchRunner {
    config: HarnessConfig,
    plan: TestPlan,
    meter: PulseMeter,
}

impl BenchRunner {
    /// The plan and config are assumed validated (see [`PlanFile::validate`]).
    pub fn new(config: HarnessConfig, plan: TestPlan) -> Self {
        let meter = config.meter();
        Self {
            config,
            plan,
            meter,
        }
    }

    pub fn from_file(file: PlanFile) -> Self {
        Self::new(file.config, file.plan)
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    /// Run every phase and return one outcome per check.
    pub fn run<B, S>(&self, bench: &mut B, sink: &mut S) -> Report
    where
        B: Signal + TickSource + ReadyPort + ?Sized,
        S: EventSink + ?Sized,
    {
        let mut run = Run {
            runner: self,
            watchdog: TickWatchdog::new(bench.now(), self.config.run_timeout_ticks),
            budget_reported: false,
            report: Report::new(),
            bench,
            sink,
        };

        run.sink.emit(&RunEvent::Started {
            phases: self.plan.phases.len(),
            checks: self.plan.checks.len(),
        });

        if run.boot() {
            for phase in &self.plan.phases {
                run.phase(phase);
            }
        } else if let Some(level) = self.config.boot_ready_level {
            for entry in &self.plan.checks {
                run.fail(entry, Error::ReadyTimeout { level });
            }
        }

        let Run { report, sink, .. } = run;
        sink.emit(&RunEvent::Finished {
            passed: report.passed(),
            total: report.total(),
            verdict: report.verdict(),
        });
        report
    }
}

// ───────────────────────────────────────────────────────────────
// Per-run state
// ───────────────────────────────────────────────────────────────

struct Run<'a, B: ?Sized, S: ?Sized> {
    runner: &'a BenchRunner,
    bench: &'a mut B,
    sink: &'a mut S,
    watchdog: TickWatchdog,
    budget_reported: bool,
    report: Report,
}

impl<B, S> Run<'_, B, S>
where
    B: Signal + TickSource + ReadyPort + ?Sized,
    S: EventSink + ?Sized,
{
    fn config(&self) -> &HarnessConfig {
        &self.runner.config
    }

    // ── Handshakes ────────────────────────────────────────────

    fn boot(&mut self) -> bool {
        let level = self.config().boot_ready_level;
        let ok = match level {
            Some(level) => {
                let budget = self.ready_budget();
                self.bench.await_ready(level, budget)
            }
            None => true,
        };
        self.sink.emit(&RunEvent::Booted { level, ok });
        ok
    }

    /// Handshake budget clipped to what the run has left.
    fn ready_budget(&self) -> u32 {
        let remaining = self.watchdog.remaining(self.bench.now());
        u64::from(self.config().ready_timeout_ticks).min(remaining) as u32
    }

    /// True (and reported once) when the run budget is spent.
    fn out_of_budget(&mut self) -> bool {
        let now = self.bench.now();
        if !self.watchdog.expired(now) {
            return false;
        }
        if !self.budget_reported {
            self.sink.emit(&RunEvent::BudgetExhausted { at_tick: now });
            self.budget_reported = true;
        }
        true
    }

    fn budget_error(&self) -> Error {
        Error::RunTimeout {
            budget: self.watchdog.budget(),
        }
    }

    // ── Phases ────────────────────────────────────────────────

    fn phase(&mut self, phase: &Phase) {
        let runner = self.runner;
        let checks: Vec<&CheckEntry> = runner.plan.checks_in(&phase.name).collect();

        if self.out_of_budget() {
            let err = self.budget_error();
            for entry in checks {
                self.fail(entry, err);
            }
            return;
        }

        info!("[TEST] Phase '{}': {} checks", phase.name, checks.len());
        self.sink.emit(&RunEvent::PhaseStarted {
            name: phase.name.clone(),
            ready_level: phase.ready_level,
        });

        if let Some(level) = phase.ready_level {
            let budget = self.ready_budget();
            if !self.bench.await_ready(level, budget) {
                self.sink.emit(&RunEvent::ReadyTimeout {
                    phase: phase.name.clone(),
                    level,
                });
                for entry in checks {
                    self.fail(entry, Error::ReadyTimeout { level });
                }
                return;
            }
        }

        let settle = phase.settle_ticks.unwrap_or(self.config().settle_ticks);
        self.bench.advance(settle);

        let mut toggles = Vec::new();
        let mut duties = Vec::new();
        for entry in checks {
            match entry.check {
                CheckKind::PulseWidth { window, samples } => {
                    if self.out_of_budget() {
                        let err = self.budget_error();
                        self.fail(entry, err);
                    } else {
                        self.pulse_check(entry, window, samples);
                    }
                }
                CheckKind::Toggle => toggles.push(entry),
                CheckKind::DutyCycle { .. } => duties.push(entry),
            }
        }

        let toggle_window = self.config().toggle_window_ticks;
        self.activity_group(&toggles, toggle_window, StopPolicy::AllToggled);
        let duty_window = self.config().duty_window_ticks;
        self.activity_group(&duties, duty_window, StopPolicy::FullWindow);
    }

    // ── Checks ────────────────────────────────────────────────

    fn pulse_check(&mut self, entry: &CheckEntry, window: ToleranceWindow, samples: u8) {
        let meter = self.runner.meter;
        let set = meter.sample(&mut *self.bench, entry.pin, usize::from(samples));

        for m in set.iter() {
            if let Some(edge) = m.timed_out {
                warn!("{}: timeout waiting for {} edge on pin {}", entry.name, edge, entry.pin);
                self.sink.emit(&RunEvent::EdgeTimeout {
                    check: entry.name.clone(),
                    pin: entry.pin,
                    edge,
                });
            }
        }

        let (value, error) = match set.as_slice() {
            [single] => match meter::check(single, &window) {
                Ok(ticks) => (Some(CheckValue::PulseWidth { ticks }), None),
                Err(e @ Error::OutOfRange { duration, .. }) => {
                    (Some(CheckValue::PulseWidth { ticks: duration }), Some(e))
                }
                Err(e) => (None, Some(e)),
            },
            many => match meter::average_of(many) {
                None => (None, Some(Error::NoValidSamples { pin: entry.pin })),
                Some(mean) => {
                    let valid = many.iter().filter(|m| m.is_valid()).count() as u8;
                    let value = CheckValue::MeanPulseWidth {
                        ticks: mean,
                        valid,
                        taken: many.len() as u8,
                    };
                    let rounded = mean.round() as u32;
                    if window.contains(rounded) {
                        (Some(value), None)
                    } else {
                        let err = Error::OutOfRange {
                            pin: entry.pin,
                            duration: rounded,
                            window,
                        };
                        (Some(value), Some(err))
                    }
                }
            },
        };

        info!(
            "[TEST] {} pulse width: {:?} (expected {})",
            entry.name, value, window
        );
        self.finish(entry, value, error);
    }

    /// Observe every pin of the group in one shared tick loop.
    fn activity_group(&mut self, entries: &[&CheckEntry], window: u32, stop: StopPolicy) {
        if entries.is_empty() {
            return;
        }
        if self.out_of_budget() {
            let err = self.budget_error();
            for entry in entries {
                self.fail(entry, err);
            }
            return;
        }

        let pins: Vec<u8> = entries.iter().map(|e| e.pin).collect();
        let activity = monitor::observe(&mut *self.bench, &pins, window, stop);
        info!(
            "[TEST] {} pins observed for {} ticks",
            activity.pins.len(),
            activity.ticks_observed
        );

        for entry in entries {
            let seen = activity
                .get(entry.pin)
                .copied()
                .unwrap_or(PinActivity::new(entry.pin));
            let result = match entry.check {
                CheckKind::DutyCycle {
                    min_high_ticks,
                    min_low_ticks,
                } => seen.check(min_high_ticks, min_low_ticks),
                _ => seen.check(1, 1),
            };
            self.finish(entry, Some(CheckValue::Activity(seen)), result.err());
        }
    }

    // ── Recording ─────────────────────────────────────────────

    fn fail(&mut self, entry: &CheckEntry, error: Error) {
        self.finish(entry, None, Some(error));
    }

    fn finish(&mut self, entry: &CheckEntry, value: Option<CheckValue>, error: Option<Error>) {
        self.sink.emit(&RunEvent::CheckFinished {
            name: entry.name.clone(),
            pin: entry.pin,
            value,
            error,
        });
        self.report.record(CheckOutcome::new(
            &entry.name,
            &entry.phase,
            entry.pin,
            value,
            error,
        ));
    }
}

// ───────────────────────────────────────────────────────────────
// Top-level driver
// ───────────────────────────────────────────────────────────────

/// Load a plan, run it, and fail if any check failed.
///
/// This is the only place a failed verdict becomes an error.
pub fn drive<P, B, S>(plans: &P, bench: &mut B, sink: &mut S) -> anyhow::Result<Report>
where
    P: PlanPort + ?Sized,
    B: Signal + TickSource + ReadyPort + ?Sized,
    S: EventSink + ?Sized,
{
    let file = plans.load().context("loading check plan")?;
    let runner = BenchRunner::from_file(file);
    let report = runner.run(bench, sink);

    info!("[TEST] Test Summary: {}", report.summary());
    if report.verdict() == Verdict::Fail {
        match report.failures().next() {
            Some(first) => bail!(
                "verification failed, {} on pins {:?} (first failure: {}: {})",
                report.summary(),
                report.failing_pins(),
                first.name,
                first
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            ),
            None => bail!("verification failed, no checks ran"),
        }
    }
    Ok(report)
}
