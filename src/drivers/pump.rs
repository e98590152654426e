//! Water pump driver.
//!
//! The pump MOSFET sits on an LEDC channel so it could be speed
//! controlled, but the controller only ever runs it fully on or off.
//! The on-board status LED mirrors the pump output.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM and GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

/// Full duty at 8-bit resolution.
const FULL_DUTY: u8 = u8::MAX;

pub struct PumpDriver {
    running: bool,
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpDriver {
    pub fn new() -> Self {
        Self { running: false }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::ledc_set(hw_init::LEDC_CH_PUMP, if on { FULL_DUTY } else { 0 });
        hw_init::gpio_write(pins::STATUS_LED_GPIO, on);
        self.running = on;
    }

    pub fn stop(&mut self) {
        self.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
