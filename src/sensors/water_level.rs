//! Max-level water sensor.
//!
//! A float switch at the top of the planter outputs a digital HIGH when
//! water reaches it, meaning the soil is already saturated.  A stuck
//! reading is not detected; it simply reads as wet or dry.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the GPIO level via hw_init helpers.
//! On host/test: reads a simulation atomic (default dry).

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_WATER: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_water(present: bool) {
    SIM_WATER.store(present, Ordering::Relaxed);
}

pub struct WaterLevelSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
    last: bool,
}

impl WaterLevelSensor {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, last: false }
    }

    /// Sample the sensor.  `true` = water present.
    pub fn read(&mut self) -> bool {
        self.last = self.read_gpio();
        self.last
    }

    /// Result of the last [`read`](Self::read).
    pub fn last(&self) -> bool {
        self.last
    }

    #[cfg(target_os = "espidf")]
    fn read_gpio(&self) -> bool {
        hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_gpio(&self) -> bool {
        SIM_WATER.load(Ordering::Relaxed)
    }
}
