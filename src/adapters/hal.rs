//! embedded-hal adapter — bridges real input pins to the bench ports.
//!
//! Owns a bank of [`InputPin`]s keyed by bench pin index and a
//! [`DelayNs`] used as the tick clock, exposing them through [`Signal`],
//! [`TickSource`] and [`ReadyPort`].  This lets the same plans that run
//! against a simulator run against a board on a logic probe or a
//! hardware-in-the-loop rig.
//!
//! Pin read failures are logged and read as low, so a broken probe shows
//! up as an edge timeout on the affected check instead of aborting.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, InputPin};
use log::{error, warn};

use crate::app::ports::{ConfigError, ReadyPort, Signal, TickSource};
use crate::meter;
use crate::monitor::MAX_PINS;

/// Bench backed by HAL input pins and a delay provider.
pub struct HalBench<P, D> {
    pins: heapless::Vec<(u8, P), MAX_PINS>,
    ready_pin: Option<u8>,
    delay: D,
    tick_period_ns: u32,
    now: u64,
}

impl<P: InputPin, D: DelayNs> HalBench<P, D> {
    /// `tick_period_ns` is the wall-clock length of one bench tick.
    pub fn new(delay: D, tick_period_ns: u32) -> Self {
        Self {
            pins: heapless::Vec::new(),
            ready_pin: None,
            delay,
            tick_period_ns: tick_period_ns.max(1),
            now: 0,
        }
    }

    /// Attach `pin` as bench pin `index`.
    pub fn attach(&mut self, index: u8, pin: P) -> Result<(), ConfigError> {
        if self.pins.iter().any(|(i, _)| *i == index) {
            return Err(ConfigError::ValidationFailed("pin index already attached"));
        }
        self.pins
            .push((index, pin))
            .map_err(|_| ConfigError::ValidationFailed("pin bank full"))
    }

    /// Use bench pin `index` as the firmware ready line.
    pub fn set_ready_pin(&mut self, index: u8) {
        self.ready_pin = Some(index);
    }
}

impl<P: InputPin, D: DelayNs> Signal for HalBench<P, D> {
    fn read_bit(&mut self, pin: u8) -> bool {
        let Some((_, io)) = self.pins.iter_mut().find(|(i, _)| *i == pin) else {
            warn!("hal: read of unattached pin {pin}");
            return false;
        };
        match io.is_high() {
            Ok(level) => level,
            Err(e) => {
                error!("hal: pin {pin} read failed: {:?}", e.kind());
                false
            }
        }
    }
}

impl<P: InputPin, D: DelayNs> TickSource for HalBench<P, D> {
    fn advance(&mut self, ticks: u32) {
        let mut ns = u64::from(ticks) * u64::from(self.tick_period_ns);
        while ns > 0 {
            let step = ns.min(u64::from(u32::MAX)) as u32;
            self.delay.delay_ns(step);
            ns -= u64::from(step);
        }
        self.now += u64::from(ticks);
    }

    fn now(&self) -> u64 {
        self.now
    }
}

impl<P: InputPin, D: DelayNs> ReadyPort for HalBench<P, D> {
    fn await_ready(&mut self, level: bool, max_ticks: u32) -> bool {
        match self.ready_pin {
            Some(pin) => meter::wait_for_level(self, pin, level, max_ticks),
            None => {
                warn!("hal: no ready pin configured, handshake skipped");
                true
            }
        }
    }
}
