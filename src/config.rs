//! System configuration parameters
//!
//! All tunable parameters for the watering controller.
//! Values can be overridden via NVS (non-volatile storage); cooldowns and the
//! drift-correction interval are fixed and live next to the code that uses them.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Dosing ---
    /// Amount of water delivered per dosing cycle (mL)
    pub pump_portion_ml: u16,
    /// One dosing period: pump run plus idle wait (milliseconds)
    pub period_ms: u32,
    /// Measured pump throughput (mL per 100 seconds)
    pub pump_flow_ml_per_100s: u16,

    // --- Container ---
    /// Supply container size (mL)
    pub container_capacity_ml: u32,
    /// Remaining volume below which the low-water alarm pulses (mL)
    pub low_water_threshold_ml: u32,

    // --- Alarm ---
    /// Alarm / backlight analog output level (0-255)
    pub alarm_intensity: u8,
    /// Low-water alarm pulse repetition period (milliseconds)
    pub alarm_pulse_period_ms: u32,
    /// Low-water alarm pulse length (milliseconds)
    pub alarm_pulse_width_ms: u32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Dosing: 100 mL every 15 minutes
            pump_portion_ml: 100,
            period_ms: 15 * 60 * 1000,
            pump_flow_ml_per_100s: 116,

            // Container
            container_capacity_ml: 28_000,
            low_water_threshold_ml: 3_000,

            // Alarm
            alarm_intensity: 50,
            alarm_pulse_period_ms: 10_000,
            alarm_pulse_width_ms: 100,

            // Timing
            control_loop_interval_ms: 50, // 20 Hz
        }
    }
}
