//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                 |
//! |-------------|--------------------|-----------------------------|
//! | `hal`       | Signal             | embedded-hal `InputPin`s    |
//! |             | TickSource         | embedded-hal `DelayNs`      |
//! |             | ReadyPort          | firmware status pin         |
//! | `log_sink`  | EventSink          | `log` facade                |
//! | `plan_file` | PlanPort           | JSON file / in-memory plan  |
//!
//! The synthetic waveform bench lives in [`crate::sim`].

pub mod hal;
pub mod log_sink;
pub mod plan_file;
