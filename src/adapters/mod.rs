//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | SensorPort         | ESP32 GPIO inputs        |
//! |                | ActuatorPort       | ESP32 LEDC PWM, GPIO     |
//! | `log_display`  | DisplayPort        | Serial log output        |
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `nvs`          | ConfigPort         | NVS / in-memory store    |
//! |                | StoragePort        |                          |
//! | `time`         | ClockPort          | ESP32 timer + RTC        |

pub mod hardware;
pub mod log_display;
pub mod log_sink;
pub mod nvs;
pub mod time;
