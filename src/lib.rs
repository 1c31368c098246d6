//! Pulse-check harness library.
//!
//! Verifies PWM outputs of a simulated (or real) chip by sampling GPIO
//! pins once per clock tick.  The core is the cycle-accurate
//! [`meter`]; around it sit the multi-pin activity [`monitor`], the
//! declarative [`plan`] table, and a generic runner in [`app::service`]
//! that executes any plan against any bench implementing the
//! [`app::ports`] traits.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod meter;
pub mod monitor;
pub mod plan;
pub mod report;
pub mod sim;
pub mod watchdog;

pub mod adapters;

mod error;

pub use error::{Error, Result};
