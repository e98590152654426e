//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets
//! the underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::alarm::AlarmDriver;
use crate::drivers::pump::PumpDriver;
use crate::fsm::context::SensorSnapshot;
use crate::sensors::SensorHub;

pub struct HardwareAdapter {
    sensor_hub: SensorHub,
    pump: PumpDriver,
    alarm: AlarmDriver,
}

impl HardwareAdapter {
    pub fn new(sensor_hub: SensorHub, pump: PumpDriver, alarm: AlarmDriver) -> Self {
        Self {
            sensor_hub,
            pump,
            alarm,
        }
    }

    pub fn pump_running(&self) -> bool {
        self.pump.is_running()
    }

    pub fn alarm_level(&self) -> u8 {
        self.alarm.level()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_inputs(&mut self) -> SensorSnapshot {
        self.sensor_hub.read_all()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_pump(&mut self, on: bool) {
        if on != self.pump.is_running() {
            self.pump.set(on);
        }
    }

    fn set_alarm(&mut self, level: u8) {
        self.alarm.set(level);
    }

    fn all_off(&mut self) {
        self.pump.stop();
        self.alarm.set(0);
    }
}
