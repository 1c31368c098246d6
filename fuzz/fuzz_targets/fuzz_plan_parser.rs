//! Fuzz target: `PlanFile::from_json`
//!
//! Feeds arbitrary bytes to the plan parser and checks:
//! - No panics under any input
//! - Anything accepted is valid and survives a JSON round trip
//!
//! cargo fuzz run fuzz_plan_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsecheck::plan::PlanFile;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(file) = PlanFile::from_json(text) else {
        return;
    };

    assert!(file.validate().is_ok(), "accepted plan must validate");
    let again = file.to_json().expect("serialize accepted plan");
    assert_eq!(PlanFile::from_json(&again).as_ref(), Ok(&file));
});
