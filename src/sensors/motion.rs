//! PIR motion sensor.
//!
//! Output HIGH while motion is detected.  Any HIGH sample re-triggers the
//! motion-stop interlock, so a person working at the planter keeps the
//! pump off until 15 minutes after they leave.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_MOTION: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_motion(detected: bool) {
    SIM_MOTION.store(detected, Ordering::Relaxed);
}

pub struct MotionSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
}

impl MotionSensor {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&self) -> bool {
        hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&self) -> bool {
        SIM_MOTION.load(Ordering::Relaxed)
    }
}
