//! Alarm / backlight buzzer output.
//!
//! A single analog (PWM) level: 0 is silent, anything else sounds the
//! buzzer at that duty.

use crate::drivers::hw_init;

pub struct AlarmDriver {
    level: u8,
}

impl Default for AlarmDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmDriver {
    pub fn new() -> Self {
        Self { level: 0 }
    }

    /// Set the output level.  Skips the register write when unchanged.
    pub fn set(&mut self, level: u8) {
        if level != self.level {
            hw_init::ledc_set(hw_init::LEDC_CH_ALARM, level);
            self.level = level;
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}
