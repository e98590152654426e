//! Sensor subsystem: individual inputs and the aggregating [`SensorHub`].
//!
//! The hub owns every input driver and produces one [`SensorSnapshot`]
//! per tick.  Nothing re-reads hardware after that within the tick.

pub mod motion;
pub mod water_level;

use crate::drivers::button;
use crate::fsm::context::SensorSnapshot;
use motion::MotionSensor;
use water_level::WaterLevelSensor;

pub struct SensorHub {
    pub water_level: WaterLevelSensor,
    pub motion: MotionSensor,
}

impl SensorHub {
    pub fn new(water_level: WaterLevelSensor, motion: MotionSensor) -> Self {
        Self {
            water_level,
            motion,
        }
    }

    /// Sample every input once.
    pub fn read_all(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            water_detected: self.water_level.read(),
            motion_detected: self.motion.read(),
            buttons: button::read_pressed(),
        }
    }
}
