//! Application core — check orchestration, zero simulator coupling.
//!
//! This module contains the run logic: phase sequencing, handshakes,
//! pulse-width and activity checks, and verdict aggregation.  All
//! interaction with the bench happens through **port traits** defined in
//! [`ports`], keeping this layer testable against synthetic waveforms.

pub mod events;
pub mod ports;
pub mod service;
