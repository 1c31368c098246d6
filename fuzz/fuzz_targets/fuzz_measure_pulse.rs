//! Fuzz target: `meter::measure_pulse`
//!
//! Turns the input into a repeating waveform (each byte pair is one run:
//! level bit and length) plus a tick budget, and checks:
//! - No panics and no unbounded loops
//! - Valid measurements have 0 < duration < budget
//! - Invalid measurements carry duration 0
//! - At most 2 * budget + 1 ticks are consumed
//!
//! cargo fuzz run fuzz_measure_pulse

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsecheck::app::ports::TickSource;
use pulsecheck::meter;
use pulsecheck::sim::{SyntheticBench, Waveform};

fuzz_target!(|data: &[u8]| {
    let Some((&budget, rest)) = data.split_first() else {
        return;
    };
    let max_ticks = u32::from(budget) * 8 + 1;

    let runs: Vec<(bool, u32)> = rest
        .chunks_exact(2)
        .map(|pair| (pair[0] & 1 == 1, u32::from(pair[1]) + 1))
        .collect();

    let mut bench = SyntheticBench::new();
    bench.at(0).drive(0, Waveform::repeating(&runs));

    let m = meter::measure_pulse(&mut bench, 0, max_ticks);

    if m.is_valid() {
        assert!(m.duration > 0 && m.duration < max_ticks);
    } else {
        assert_eq!(m.duration, 0);
        assert!(m.timed_out.is_some());
    }
    assert!(bench.now() <= 2 * u64::from(max_ticks) + 1);
});
