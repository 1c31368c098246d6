//! End-to-end runs of the bench runner against synthetic benches.

use pulsecheck::Error;
use pulsecheck::app::events::RunEvent;
use pulsecheck::app::ports::TickSource;
use pulsecheck::app::service::BenchRunner;
use pulsecheck::config::HarnessConfig;
use pulsecheck::meter::{Edge, ToleranceWindow};
use pulsecheck::plan::{CheckEntry, CheckKind, Phase, TestPlan, servo_plan, toggle_bank_plan};
use pulsecheck::report::{CheckValue, Verdict};
use pulsecheck::sim::{SyntheticBench, Waveform};

use crate::mock_bench::{MAXIMUM, MINIMUM, NEUTRAL, RecordingSink, ready_bench, servo_bench};

/// Defaults without the boot handshake.
fn no_boot() -> HarnessConfig {
    HarnessConfig {
        boot_ready_level: None,
        ..HarnessConfig::default()
    }
}

fn single_phase(checks: Vec<CheckEntry>) -> TestPlan {
    TestPlan {
        phases: vec![Phase::new("main", None)],
        checks,
    }
}

fn pulse(window: ToleranceWindow, samples: u8) -> CheckKind {
    CheckKind::PulseWidth { window, samples }
}

// ── Servo sweep ───────────────────────────────────────────────

#[test]
fn servo_sweep_passes_on_nominal_waveforms() {
    let runner = BenchRunner::new(HarnessConfig::default(), servo_plan());
    let mut bench = servo_bench(MAXIMUM);
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    assert_eq!(report.verdict(), Verdict::Pass, "{:?}", report.outcomes());
    assert_eq!(report.total(), 8);
    let widths: Vec<Option<CheckValue>> = report.outcomes().iter().map(|o| o.value).collect();
    let expected: Vec<Option<CheckValue>> = [NEUTRAL, MINIMUM, NEUTRAL, MAXIMUM]
        .into_iter()
        .flat_map(|ticks| [ticks, ticks])
        .map(|ticks| Some(CheckValue::PulseWidth { ticks }))
        .collect();
    assert_eq!(widths, expected);
}

#[test]
fn servo_sweep_reports_out_of_range_maximum() {
    let runner = BenchRunner::new(HarnessConfig::default(), servo_plan());
    let mut bench = servo_bench(34_000);
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    assert_eq!(report.verdict(), Verdict::Fail);
    assert_eq!(report.passed(), 6);
    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 2);
    for outcome in failed {
        assert_eq!(outcome.phase, "maximum");
        assert_eq!(outcome.value, Some(CheckValue::PulseWidth { ticks: 34_000 }));
        assert!(matches!(
            outcome.error,
            Some(Error::OutOfRange {
                duration: 34_000,
                ..
            })
        ));
    }
}

#[test]
fn event_stream_is_bracketed() {
    let runner = BenchRunner::new(HarnessConfig::default(), servo_plan());
    let mut bench = servo_bench(MAXIMUM);
    let mut sink = RecordingSink::new();

    runner.run(&mut bench, &mut sink);

    assert_eq!(
        sink.events.first(),
        Some(&RunEvent::Started {
            phases: 4,
            checks: 8
        })
    );
    assert_eq!(
        sink.events.get(1),
        Some(&RunEvent::Booted {
            level: Some(true),
            ok: true
        })
    );
    assert_eq!(
        sink.last(),
        Some(&RunEvent::Finished {
            passed: 8,
            total: 8,
            verdict: Verdict::Pass
        })
    );
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::PhaseStarted { .. })),
        4
    );
}

// ── Timeouts ──────────────────────────────────────────────────

#[test]
fn stuck_low_pin_fails_without_aborting() {
    let plan = single_phase(vec![
        CheckEntry::new(5, "PWM5", "main", pulse(ToleranceWindow::new(16_000, 20_000), 1)),
        CheckEntry::new(6, "PWM6", "main", pulse(ToleranceWindow::new(40, 60), 1)),
    ]);
    let runner = BenchRunner::new(no_boot(), plan);
    let mut bench = SyntheticBench::new();
    bench.at(0).drive(6, Waveform::pwm(100, 50));
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    let stuck = &report.outcomes()[0];
    assert_eq!(
        stuck.error,
        Some(Error::EdgeTimeout {
            pin: 5,
            edge: Edge::Rising
        })
    );
    assert_eq!(stuck.value, None);
    assert!(report.outcomes()[1].passed, "later checks still run");
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::EdgeTimeout { pin: 5, .. })),
        1
    );
}

#[test]
fn stuck_high_pin_is_falling_timeout() {
    let plan = single_phase(vec![CheckEntry::new(
        2,
        "PWM2",
        "main",
        pulse(ToleranceWindow::new(1, 10), 1),
    )]);
    let config = HarnessConfig {
        max_ticks: 2_000,
        ..no_boot()
    };
    let runner = BenchRunner::new(config, plan);
    let mut bench = SyntheticBench::new();
    bench.at(0).drive(2, Waveform::constant(true));

    let report = runner.run(&mut bench, &mut RecordingSink::new());

    assert_eq!(
        report.outcomes()[0].error,
        Some(Error::EdgeTimeout {
            pin: 2,
            edge: Edge::Falling
        })
    );
}

#[test]
fn boot_timeout_fails_every_check() {
    let config = HarnessConfig {
        ready_timeout_ticks: 1_000,
        ..HarnessConfig::default()
    };
    let runner = BenchRunner::new(config, servo_plan());
    let mut bench = SyntheticBench::new();
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    assert_eq!(report.total(), 8);
    assert!(
        report
            .outcomes()
            .iter()
            .all(|o| o.error == Some(Error::ReadyTimeout { level: true }))
    );
    assert!(sink.events.contains(&RunEvent::Booted {
        level: Some(true),
        ok: false
    }));
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::PhaseStarted { .. })),
        0
    );
    assert_eq!(bench.now(), 1_000);
}

#[test]
fn phase_handshake_timeout_skips_only_that_phase() {
    let plan = TestPlan {
        phases: vec![Phase::new("armed", Some(true)), Phase::new("free", None)],
        checks: vec![
            CheckEntry::new(2, "ARMED", "armed", pulse(ToleranceWindow::new(40, 60), 1)),
            CheckEntry::new(2, "FREE", "free", pulse(ToleranceWindow::new(40, 60), 1)),
        ],
    };
    let config = HarnessConfig {
        max_ticks: 1_000,
        ready_timeout_ticks: 1_000,
        ..no_boot()
    };
    let runner = BenchRunner::new(config, plan);
    let mut bench = SyntheticBench::new();
    bench.at(0).drive(2, Waveform::pwm(100, 50));
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    assert_eq!(
        report.outcomes()[0].error,
        Some(Error::ReadyTimeout { level: true })
    );
    assert_eq!(
        report.outcomes()[1].value,
        Some(CheckValue::PulseWidth { ticks: 50 })
    );
    assert!(sink.events.contains(&RunEvent::ReadyTimeout {
        phase: "armed".into(),
        level: true
    }));
}

#[test]
fn run_budget_exhaustion_fails_remaining_checks() {
    let plan = TestPlan {
        phases: vec![Phase::new("first", None), Phase::new("second", None)],
        checks: vec![
            CheckEntry::new(0, "A", "first", pulse(ToleranceWindow::new(1, 10), 1)),
            CheckEntry::new(0, "B", "second", pulse(ToleranceWindow::new(1, 10), 1)),
            CheckEntry::new(1, "C", "second", CheckKind::Toggle),
        ],
    };
    let config = HarnessConfig {
        max_ticks: 60_000,
        ready_timeout_ticks: 50_000,
        run_timeout_ticks: 100_000,
        ..no_boot()
    };
    let runner = BenchRunner::new(config, plan);
    let mut bench = SyntheticBench::new();
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    assert!(matches!(
        report.outcomes()[0].error,
        Some(Error::EdgeTimeout { .. })
    ));
    for outcome in &report.outcomes()[1..] {
        assert_eq!(outcome.error, Some(Error::RunTimeout { budget: 100_000 }));
    }
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::BudgetExhausted { .. })),
        1
    );
    // Settle plus warm-up plus one sample, nothing after.
    assert_eq!(bench.now(), 10_000 + 2 * 60_001);
}

// ── Activity checks ───────────────────────────────────────────

#[test]
fn toggle_bank_flags_the_dead_output() {
    let runner = BenchRunner::new(no_boot(), toggle_bank_plan(8, 6));
    let mut bench = SyntheticBench::new();
    for (i, pin) in (8u8..13).enumerate() {
        let half = 50 + 25 * i as u32;
        bench.at(0).drive(pin, Waveform::pwm(half, half));
    }
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    assert_eq!(report.passed(), 5);
    let dead = &report.outcomes()[5];
    assert_eq!(dead.name, "PWM5");
    assert_eq!(
        dead.error,
        Some(Error::NotToggling {
            pin: 13,
            high_ticks: 0,
            low_ticks: 50_000
        })
    );
    assert_eq!(bench.now(), 10_000 + 50_000, "full window when a pin is dead");
}

#[test]
fn toggle_bank_stops_early_when_all_toggle() {
    let runner = BenchRunner::new(no_boot(), toggle_bank_plan(0, 4));
    let mut bench = SyntheticBench::new();
    for pin in 0..4u8 {
        bench.at(0).drive(pin, Waveform::pwm(200, 100));
    }

    let report = runner.run(&mut bench, &mut RecordingSink::new());

    assert_eq!(report.verdict(), Verdict::Pass);
    assert!(bench.now() < 10_000 + 1_000, "stopped at {}", bench.now());
}

#[test]
fn duty_cycle_counts_full_window() {
    let duty = CheckKind::DutyCycle {
        min_high_ticks: 100,
        min_low_ticks: 100,
    };
    let plan = single_phase(vec![
        CheckEntry::new(10, "PWM10", "main", duty),
        CheckEntry::new(11, "PWM11", "main", duty),
    ]);
    let runner = BenchRunner::new(no_boot(), plan);
    let mut bench = SyntheticBench::new();
    bench
        .at(0)
        .drive(10, Waveform::pwm(3_000, 1_000))
        .drive(11, Waveform::pwm(3_990, 10));

    let report = runner.run(&mut bench, &mut RecordingSink::new());

    let good = &report.outcomes()[0];
    assert!(good.passed);
    match good.value {
        Some(CheckValue::Activity(a)) => {
            assert_eq!((a.high_ticks, a.low_ticks), (1_000, 3_000));
            assert_eq!(a.duty_percent(), Some(25.0));
        }
        other => panic!("unexpected value {other:?}"),
    }
    assert_eq!(
        report.outcomes()[1].error,
        Some(Error::NotToggling {
            pin: 11,
            high_ticks: 10,
            low_ticks: 3_990
        })
    );
    assert_eq!(bench.now(), 10_000 + 4_000);
}

#[test]
fn duty_cycle_needs_more_than_a_hundred_ticks_per_level() {
    let duty = CheckKind::DutyCycle {
        min_high_ticks: 101,
        min_low_ticks: 101,
    };
    let plan = single_phase(vec![
        CheckEntry::new(20, "EXACT", "main", duty),
        CheckEntry::new(21, "ABOVE", "main", duty),
    ]);
    let runner = BenchRunner::new(no_boot(), plan);
    let mut bench = SyntheticBench::new();
    bench
        .at(0)
        .drive(20, Waveform::pwm(3_900, 100))
        .drive(21, Waveform::pwm(3_899, 101));

    let report = runner.run(&mut bench, &mut RecordingSink::new());

    assert_eq!(
        report.outcomes()[0].error,
        Some(Error::NotToggling {
            pin: 20,
            high_ticks: 100,
            low_ticks: 3_900
        })
    );
    assert!(report.outcomes()[1].passed);
}

// ── Averaging ─────────────────────────────────────────────────

#[test]
fn averaged_check_uses_mean_of_samples() {
    let plan = single_phase(vec![CheckEntry::new(
        4,
        "PWM4",
        "main",
        pulse(ToleranceWindow::new(17_900, 18_100), 4),
    )]);
    let runner = BenchRunner::new(no_boot(), plan);
    let mut bench = ready_bench();
    bench.at(0).drive(
        4,
        Waveform::repeating(&[(false, 100), (true, 18_010), (false, 100), (true, 17_990)]),
    );

    let report = runner.run(&mut bench, &mut RecordingSink::new());

    let outcome = &report.outcomes()[0];
    assert!(outcome.passed, "{outcome:?}");
    assert_eq!(
        outcome.value,
        Some(CheckValue::MeanPulseWidth {
            ticks: 18_000.0,
            valid: 4,
            taken: 4
        })
    );
}

#[test]
fn averaged_check_with_no_valid_samples() {
    let plan = single_phase(vec![CheckEntry::new(
        7,
        "PWM7",
        "main",
        pulse(ToleranceWindow::new(10, 20), 3),
    )]);
    let config = HarnessConfig {
        max_ticks: 1_000,
        ..no_boot()
    };
    let runner = BenchRunner::new(config, plan);
    let mut bench = SyntheticBench::new();
    let mut sink = RecordingSink::new();

    let report = runner.run(&mut bench, &mut sink);

    assert_eq!(
        report.outcomes()[0].error,
        Some(Error::NoValidSamples { pin: 7 })
    );
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::EdgeTimeout { .. })),
        3,
        "warm-up timeouts are not reported"
    );
}
