//! PlantWater Firmware — Main Entry Point
//!
//! Hexagonal architecture with a fixed-rate control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Clock      │
//! │  (Sensor+Actuator) (EventSink)    (Config+NVS) (ClockPort)     │
//! │  LogDisplay                                                    │
//! │  (DisplayPort)                                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · Interlock · Statistics · Ledger · TimeKeeper    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Presentation (render → DisplayPort, alarm level)              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use plantwater::adapters::hardware::HardwareAdapter;
use plantwater::adapters::log_display::LogDisplay;
use plantwater::adapters::log_sink::LogEventSink;
use plantwater::adapters::nvs::NvsAdapter;
use plantwater::adapters::time::Esp32ClockAdapter;
use plantwater::app::ports::{ActuatorPort, ConfigPort, DisplayPort};
use plantwater::app::service::AppService;
use plantwater::config::SystemConfig;
use plantwater::drivers::alarm::AlarmDriver;
use plantwater::drivers::hw_init;
use plantwater::drivers::pump::PumpDriver;
use plantwater::ledger::Ledger;
use plantwater::pins;
use plantwater::presentation::{self, AlarmPolicy};
use plantwater::sensors::SensorHub;
use plantwater::sensors::motion::MotionSensor;
use plantwater::sensors::water_level::WaterLevelSensor;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PlantWater v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without GPIO/LEDC the pump cannot be driven safely.
        error!("HAL init failed: {} — halting", e);
        return Err(anyhow::anyhow!(plantwater::error::Error::from(e).to_string()));
    }

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{}, using defaults", plantwater::error::Error::from(e));
            SystemConfig::default()
        }
    };
    let loop_interval = std::time::Duration::from_millis(u64::from(config.control_loop_interval_ms));
    let alarm_policy = AlarmPolicy::from_config(&config);

    // ── 4. Adapters ───────────────────────────────────────────
    let sensor_hub = SensorHub::new(
        WaterLevelSensor::new(pins::WATER_LEVEL_GPIO),
        MotionSensor::new(pins::MOTION_GPIO),
    );
    let mut hw = HardwareAdapter::new(sensor_hub, PumpDriver::new(), AlarmDriver::new());
    hw.all_off();

    let mut clock = Esp32ClockAdapter::new();
    let mut ledger = Ledger::new(nvs);
    let mut log_sink = LogEventSink::new();
    let mut display = LogDisplay::new();

    // ── 5. Boot the controller ────────────────────────────────
    let mut app = AppService::boot(config, &mut clock, &mut ledger, &mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        app.tick(&mut hw, &mut clock, &mut ledger, &mut log_sink);

        let view = app.status();
        let frame = presentation::render(&view, &alarm_policy);
        hw.set_alarm(frame.alarm);
        display.set_backlight(app.backlight_on());
        display.show(&frame);

        std::thread::sleep(loop_interval);
    }
}
