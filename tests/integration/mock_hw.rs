//! Mock adapters for integration tests.
//!
//! Inputs are plain fields the test flips; outputs and storage writes are
//! recorded so tests can assert on the full history without touching real
//! GPIO/PWM registers or flash.

#![allow(dead_code)]

use std::collections::HashMap;

use plantwater::adapters::log_sink::LogEventSink;
use plantwater::app::events::AppEvent;
use plantwater::app::ports::{
    ActuatorPort, ClockPort, EventSink, SensorPort, StorageError, StoragePort,
};
use plantwater::app::service::AppService;
use plantwater::clock::EPOCH_OFFSET_SECS;
use plantwater::config::SystemConfig;
use plantwater::drivers::button::{Button, ButtonSet};
use plantwater::fsm::context::SensorSnapshot;
use plantwater::ledger::{Ledger, PersistentRecord};
use plantwater::presentation::{self, AlarmPolicy, Frame};

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub water: bool,
    pub motion: bool,
    pub buttons: ButtonSet,
    pub pump_on: bool,
    /// Number of off → on pump edges.
    pub pump_starts: u32,
    pub alarm: u8,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SensorPort for MockHardware {
    fn read_inputs(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            water_detected: self.water,
            motion_detected: self.motion,
            buttons: self.buttons,
        }
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) {
        if on && !self.pump_on {
            self.pump_starts += 1;
        }
        self.pump_on = on;
    }

    fn set_alarm(&mut self, level: u8) {
        self.alarm = level;
    }

    fn all_off(&mut self) {
        self.pump_on = false;
        self.alarm = 0;
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Monotonic counter under test control plus an RTC that follows it.
pub struct MockClock {
    pub monotonic: u64,
    /// RTC reading at monotonic zero (Unix ms).
    pub wall_base: u64,
    pub rtc_running: bool,
}

impl MockClock {
    /// A clock whose internal time is `start_ms` at monotonic zero.
    pub fn at(start_ms: u64) -> Self {
        Self {
            monotonic: 0,
            wall_base: EPOCH_OFFSET_SECS * 1000 + start_ms,
            rtc_running: true,
        }
    }
}

impl ClockPort for MockClock {
    fn wall_clock_ms(&mut self) -> Option<u64> {
        self.rtc_running.then(|| self.wall_base + self.monotonic)
    }

    fn monotonic_ms(&self) -> u64 {
        self.monotonic
    }
}

// ── MemStorage ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemStorage {
    store: HashMap<String, Vec<u8>>,
    pub writes: usize,
    pub fail_writes: bool,
    pub fail_reads: bool,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage already holding `record`.
    pub fn with_record(record: &PersistentRecord) -> Self {
        let mut ledger = Ledger::new(Self::new());
        ledger.store(record).unwrap();
        let mut storage = ledger.storage().clone();
        storage.writes = 0;
        storage
    }
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        if self.fail_reads {
            return Err(StorageError::IoError);
        }
        match self.store.get(&format!("{namespace}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.store.insert(format!("{namespace}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{namespace}::{key}"));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Keeps every event and forwards it to the log adapter.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
    log: LogEventSink,
}

impl RecordingSink {
    pub fn count(&self, event: &AppEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.count(event) > 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        self.events.push(*event);
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A booted controller with every port mocked.
pub struct Rig {
    pub app: AppService,
    pub hw: MockHardware,
    pub clock: MockClock,
    pub ledger: Ledger<MemStorage>,
    pub sink: RecordingSink,
}

impl Rig {
    /// Boot at internal time `start_ms` on fresh storage.
    pub fn boot_at(start_ms: u64) -> Self {
        Self::boot_with(MemStorage::new(), MockClock::at(start_ms))
    }

    pub fn boot_with(storage: MemStorage, mut clock: MockClock) -> Self {
        let mut ledger = Ledger::new(storage);
        let mut sink = RecordingSink::default();
        let app = AppService::boot(SystemConfig::default(), &mut clock, &mut ledger, &mut sink);
        Self {
            app,
            hw: MockHardware::new(),
            clock,
            ledger,
            sink,
        }
    }

    pub fn tick(&mut self) {
        self.app
            .tick(&mut self.hw, &mut self.clock, &mut self.ledger, &mut self.sink);
    }

    /// Advance the monotonic clock in `step_ms` increments, ticking after
    /// each, until it reaches `until_ms`.
    pub fn run_until(&mut self, until_ms: u64, step_ms: u64) {
        while self.clock.monotonic + step_ms <= until_ms {
            self.clock.monotonic += step_ms;
            self.tick();
        }
    }

    /// Like [`run_until`](Self::run_until) but returns the monotonic time
    /// of the first tick that turned the pump on.
    pub fn run_until_pump_starts(&mut self, until_ms: u64, step_ms: u64) -> Option<u64> {
        let starts = self.hw.pump_starts;
        while self.clock.monotonic + step_ms <= until_ms {
            self.clock.monotonic += step_ms;
            self.tick();
            if self.hw.pump_starts > starts {
                return Some(self.clock.monotonic);
            }
        }
        None
    }

    /// One tick with `button` held, then one with it released.
    pub fn press(&mut self, button: Button, step_ms: u64) {
        self.press_together(&[button], step_ms);
    }

    /// Like [`press`](Self::press) with several buttons held on one tick.
    pub fn press_together(&mut self, buttons: &[Button], step_ms: u64) {
        self.hw.buttons = buttons.iter().copied().collect();
        self.clock.monotonic += step_ms;
        self.tick();
        self.hw.buttons = ButtonSet::EMPTY;
        self.clock.monotonic += step_ms;
        self.tick();
    }

    /// Render the current status the way the firmware loop does.
    pub fn frame(&self) -> Frame {
        let policy = AlarmPolicy::from_config(self.app.config());
        presentation::render(&self.app.status(), &policy)
    }
}

/// A persisted record with every checkpoint at `at_ms`.
pub fn record_at(at_ms: u64, day: u8) -> PersistentRecord {
    PersistentRecord {
        statistics: [0; 24],
        pumped_total_ml: 0,
        last_hour_started_ms: at_ms,
        pump_started_ms: at_ms,
        idle_started_ms: at_ms,
        last_wet_ms: None,
        statistics_day: day,
    }
}
