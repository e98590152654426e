//! GPIO / peripheral pin assignments for the controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pump
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the pump MOSFET.  Used as on/off only.
pub const PUMP_PWM_GPIO: i32 = 1;
/// On-board status LED, lit while the pump runs.
pub const STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Alarm / backlight buzzer
// ---------------------------------------------------------------------------

/// LEDC PWM output; duty is the alarm intensity.
pub const ALARM_PWM_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Sensors — Digital
// ---------------------------------------------------------------------------

/// Max-level float switch.  HIGH = water present.
pub const WATER_LEVEL_GPIO: i32 = 8;
/// PIR motion sensor output.  HIGH = motion.
pub const MOTION_GPIO: i32 = 9;
/// Ground return for the motion sensor, driven LOW at init.
pub const MOTION_GROUND_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Buttons 1–8, in order.
pub const BUTTON_GPIOS: [i32; 8] = [4, 5, 6, 7, 15, 16, 17, 18];

// ---------------------------------------------------------------------------
// I²C bus (16x2 character display backpack)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 11;
pub const I2C_SCL_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// Pump PWM frequency (25 kHz, inaudible).
pub const PUMP_PWM_FREQ_HZ: u32 = 25_000;
/// Alarm PWM frequency, audible on a passive buzzer.
pub const ALARM_PWM_FREQ_HZ: u32 = 2_000;
