//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against synthetic benches.  All tests run on the host with no
//! simulator or hardware required.

mod drive_tests;
mod mock_bench;
mod runner_tests;
