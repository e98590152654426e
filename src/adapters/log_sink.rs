//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => info!("START | initial_state={state:?}"),
            AppEvent::StateChanged { from, to } => info!("STATE | {from:?} -> {to:?}"),
            AppEvent::CycleCompleted(c) => info!(
                "CYCLE | {} ml in {} ms{}",
                c.delivered_ml,
                c.pumped_ms,
                if c.truncated { " (cut short)" } else { "" }
            ),
            AppEvent::IdleWindowRestarted => info!("CYCLE | skipped, idle window restarted"),
            AppEvent::DayRolledOver { day } => info!("STATS | new day {day}"),
            AppEvent::ClockCorrected { delta_ms } => info!("CLOCK | corrected {delta_ms:+} ms"),
            AppEvent::ClockFallback => warn!("CLOCK | RTC not running, using build time"),
            AppEvent::LedgerInitialised => info!("LEDGER | initialised"),
            AppEvent::LedgerRestored => info!("LEDGER | restored"),
            AppEvent::LedgerLoadFailed(e) => warn!("LEDGER | load failed: {e}"),
            AppEvent::LedgerWriteFailed(e) => warn!("LEDGER | write failed: {e}"),
            AppEvent::InterlockArmed(ch) => info!("LOCK | {ch} armed"),
            AppEvent::InterlockCleared(ch) => info!("LOCK | {ch} cleared"),
            AppEvent::ContainerReset => info!("USER | container refilled"),
            AppEvent::FactoryReset => info!("USER | factory reset"),
            AppEvent::BacklightToggled(on) => {
                info!("USER | backlight {}", if *on { "on" } else { "off" });
            }
            AppEvent::ForceStopRequested => info!("USER | force stop"),
        }
    }
}
