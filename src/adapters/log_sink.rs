//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing run events through the `log`
//! facade (which the embedding test binary routes wherever it likes).
//! A CI annotation or JSON-lines adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::RunEvent;
use crate::app::ports::EventSink;
use crate::report::{CheckValue, Verdict};

/// Adapter that logs every [`RunEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn describe(value: &CheckValue) -> String {
    match value {
        CheckValue::PulseWidth { ticks } => format!("width={ticks} ticks"),
        CheckValue::MeanPulseWidth {
            ticks,
            valid,
            taken,
        } => format!("mean={ticks:.1} ticks ({valid}/{taken} valid)"),
        CheckValue::Activity(a) => match a.duty_percent() {
            Some(duty) => format!(
                "high={} low={} duty={:.2}%",
                a.high_ticks, a.low_ticks, duty
            ),
            None => "no samples".to_owned(),
        },
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Started { phases, checks } => {
                info!("START | phases={} checks={}", phases, checks);
            }
            RunEvent::Booted { level, ok } => match (level, ok) {
                (None, _) => info!("BOOT | no handshake"),
                (Some(l), true) => info!("BOOT | ready={} | firmware configuration complete", u8::from(*l)),
                (Some(l), false) => error!("BOOT | ready={} never seen", u8::from(*l)),
            },
            RunEvent::PhaseStarted { name, ready_level } => match ready_level {
                Some(l) => info!("PHASE | {} | await ready={}", name, u8::from(*l)),
                None => info!("PHASE | {}", name),
            },
            RunEvent::ReadyTimeout { phase, level } => {
                error!("PHASE | {} | ready={} timed out", phase, u8::from(*level));
            }
            RunEvent::EdgeTimeout { check, pin, edge } => {
                warn!("EDGE | {} | pin {} | timeout waiting for {} edge", check, pin, edge);
            }
            RunEvent::CheckFinished {
                name,
                pin,
                value,
                error: err,
            } => {
                let detail = value.as_ref().map(describe).unwrap_or_default();
                match err {
                    None => info!("CHECK | {} | pin {} | pass | {}", name, pin, detail),
                    Some(e) => error!("CHECK | {} | pin {} | FAIL | {} {}", name, pin, e, detail),
                }
            }
            RunEvent::BudgetExhausted { at_tick } => {
                error!("BUDGET | exhausted at tick {}", at_tick);
            }
            RunEvent::Finished {
                passed,
                total,
                verdict,
            } => match verdict {
                Verdict::Pass => info!("DONE | {}/{} checks passed | {}", passed, total, verdict),
                Verdict::Fail => error!("DONE | {}/{} checks passed | {}", passed, total, verdict),
            },
        }
    }
}
