//! Application service — the hexagonal core.
//!
//! [`AppService`] owns every piece of controller state: the scheduler FSM
//! and its context, the safety interlock, the statistics, the time
//! anchor and the button edge detector.  There are no globals; all I/O
//! flows through port traits passed in at each call.
//!
//! ```text
//!   ClockPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  SensorPort ──▶ │          AppService          │
//! ActuatorPort ◀──│ FSM · Interlock · Statistics │ ──▶ Ledger (StoragePort)
//!                 └──────────────────────────────┘
//! ```
//!
//! ## Tick order
//!
//! 1. Read the monotonic clock once; every timestamp this tick is `now`.
//! 2. Calendar-day change → statistics rollover, persist.
//! 3. Hourly drift correction (idle only), persist.
//! 4. Sample inputs once; button press edges become commands, applied
//!    factory reset first and force stop last; motion re-triggers the
//!    motion stop.
//! 5. Sticky wet latch → Wet trigger; evaluate the interlock.
//! 6. Scheduler step; a finished cycle is recorded; persist on any
//!    transition or skipped dose.
//! 7. Drive the pump output.
//!
//! Every ledger write completes before `tick` returns.

use log::{error, info, warn};

use crate::clock::{self, TimeKeeper};
use crate::config::SystemConfig;
use crate::drivers::button::ButtonDriver;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::ledger::{Ledger, PersistentRecord};
use crate::presentation::StatusView;
use crate::safety::{InterlockChannel, SafetyInterlock};
use crate::scheduler::DosingPlan;
use crate::statistics::PumpStatistics;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, ClockPort, EventSink, SensorPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    config: SystemConfig,
    fsm: Fsm,
    ctx: FsmContext,
    interlock: SafetyInterlock,
    /// Mask from the last interlock evaluation.
    interlock_mask: u8,
    stats: PumpStatistics,
    time: TimeKeeper,
    buttons: ButtonDriver,
    backlight_on: bool,
}

impl AppService {
    // ── Lifecycle ─────────────────────────────────────────────

    /// Anchor time, restore (or initialise) the ledger and start the
    /// scheduler in `Idle`.
    pub fn boot(
        config: SystemConfig,
        clock: &mut impl ClockPort,
        ledger: &mut Ledger<impl StoragePort>,
        sink: &mut impl EventSink,
    ) -> Self {
        let monotonic = clock.monotonic_ms();
        let wall = if let Some(wall) = clock.wall_clock_ms() {
            wall
        } else {
            warn!("RTC is not running, seeding time from build timestamp");
            sink.emit(&AppEvent::ClockFallback);
            clock::build_time_unix_ms()
        };
        let time = TimeKeeper::anchored(wall, monotonic);
        let now = time.now(monotonic);
        info!("boot: {}", clock::calendar(now));

        let plan = DosingPlan::from_config(&config);
        let mut app = Self {
            config,
            fsm: Fsm::new(build_state_table(), StateId::Idle),
            ctx: FsmContext::new(plan, now),
            interlock: SafetyInterlock::new(),
            interlock_mask: 0,
            stats: PumpStatistics::new(clock::day_of_month(now)),
            time,
            buttons: ButtonDriver::new(),
            backlight_on: false,
        };

        match ledger.load() {
            Ok(record) => {
                app.restore(&record, now);
                sink.emit(&AppEvent::LedgerRestored);
            }
            Err(e) if e.needs_reset() => {
                warn!("ledger unusable ({e}), performing full reset");
                app.full_reset(now);
                app.persist(ledger, sink);
                sink.emit(&AppEvent::LedgerInitialised);
            }
            Err(e) => {
                // Storage itself failed: run on fresh state; the next
                // state-affecting event rewrites the whole record.
                error!("ledger load failed ({e}), starting from a clean slate");
                app.full_reset(now);
                sink.emit(&AppEvent::LedgerLoadFailed(e));
            }
        }
        info!("history (newest first): {:?}", app.stats.slots);

        app.fsm.start(&mut app.ctx);
        sink.emit(&AppEvent::Started(app.fsm.current_state()));
        info!(
            "AppService started: pump {} ms / idle {} ms",
            plan.pump_duration_ms, plan.idle_duration_ms
        );
        app
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &mut impl ClockPort,
        ledger: &mut Ledger<impl StoragePort>,
        sink: &mut impl EventSink,
    ) {
        // 1. Time
        let monotonic = clock.monotonic_ms();
        self.ctx.now_ms = self.time.now(monotonic);

        // 2. Day rollover
        let day = clock::day_of_month(self.ctx.now_ms);
        if self.stats.observe_day(day) {
            sink.emit(&AppEvent::DayRolledOver { day });
            self.persist(ledger, sink);
        }

        // 3. Drift correction, never while a run is being timed
        if self.fsm.current_state() == StateId::Idle && self.time.correction_due(self.ctx.now_ms) {
            let floor = self.latest_timestamp();
            let delta_ms = self.time.correct(clock.wall_clock_ms(), monotonic, floor);
            self.ctx.now_ms = self.time.now(monotonic);
            sink.emit(&AppEvent::ClockCorrected { delta_ms });
            self.persist(ledger, sink);
        }
        let now = self.ctx.now_ms;

        // 4. Inputs
        let snapshot = hw.read_inputs();
        self.ctx.sensors = snapshot;
        let mut commands: heapless::Vec<AppCommand, 8> = heapless::Vec::new();
        for button in self.buttons.tick(snapshot.buttons).iter() {
            if let Some(cmd) = AppCommand::for_button(button) {
                info!("button {} pressed -> {:?}", button.number(), cmd);
                // At most one command per button, so this cannot overflow.
                let _ = commands.push(cmd);
            }
        }
        commands.sort_unstable_by_key(|cmd| cmd.priority());
        for cmd in commands {
            self.handle_command(cmd, hw, ledger, sink);
        }
        if snapshot.motion_detected {
            self.interlock.trigger(InterlockChannel::MotionStop, now);
        }

        // 5. Wet latch and interlock
        if snapshot.water_detected {
            self.ctx.seen_wet = true;
        }
        if self.ctx.seen_wet {
            self.interlock.trigger(InterlockChannel::Wet, now);
        }
        self.evaluate_interlock(sink);

        // 6. Scheduler
        self.ctx.idle_window_restarted = false;
        let transition = self.fsm.tick(&mut self.ctx);
        self.take_cycle_report(sink);
        if let Some((from, to)) = transition {
            sink.emit(&AppEvent::StateChanged { from, to });
            self.persist(ledger, sink);
        } else if self.ctx.idle_window_restarted {
            sink.emit(&AppEvent::IdleWindowRestarted);
            self.persist(ledger, sink);
        }

        // 7. Outputs
        hw.set_pump(self.ctx.commands.pump_on);
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply a user action immediately, at the current tick's time.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        ledger: &mut Ledger<impl StoragePort>,
        sink: &mut impl EventSink,
    ) {
        let now = self.ctx.now_ms;
        match cmd {
            AppCommand::ResetContainer => {
                info!("container refilled ({} ml pumped since last refill)", self.stats.pumped_total_ml);
                self.stats.reset_container();
                sink.emit(&AppEvent::ContainerReset);
                self.persist(ledger, sink);
            }
            AppCommand::FactoryReset => {
                warn!("factory reset requested");
                if self.fsm.current_state() == StateId::Pumping {
                    self.force_idle(hw, sink);
                    // Statistics are about to be wiped.
                    self.ctx.completed_cycle = None;
                }
                if let Err(e) = ledger.invalidate() {
                    warn!("ledger invalidate failed: {e}");
                }
                self.full_reset(now);
                self.persist(ledger, sink);
                sink.emit(&AppEvent::FactoryReset);
            }
            AppCommand::ToggleBacklight => {
                self.backlight_on = !self.backlight_on;
                sink.emit(&AppEvent::BacklightToggled(self.backlight_on));
            }
            AppCommand::ForceStop => {
                self.interlock.trigger(InterlockChannel::ForceStop, now);
                sink.emit(&AppEvent::ForceStopRequested);
                if self.fsm.current_state() == StateId::Pumping {
                    self.force_idle(hw, sink);
                    self.take_cycle_report(sink);
                    self.persist(ledger, sink);
                }
                self.evaluate_interlock(sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Internal time as of the last tick.
    pub fn now_ms(&self) -> u64 {
        self.ctx.now_ms
    }

    pub fn statistics(&self) -> &PumpStatistics {
        &self.stats
    }

    pub fn interlock(&self) -> &SafetyInterlock {
        &self.interlock
    }

    /// Whether a dose could start right now.
    pub fn can_start(&self) -> bool {
        self.interlock.can_start(self.ctx.now_ms)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn plan(&self) -> &DosingPlan {
        &self.ctx.plan
    }

    pub fn backlight_on(&self) -> bool {
        self.backlight_on
    }

    /// Sticky wet latch.
    pub fn seen_wet(&self) -> bool {
        self.ctx.seen_wet
    }

    pub fn idle_started_ms(&self) -> u64 {
        self.ctx.idle_started_ms
    }

    pub fn pump_started_ms(&self) -> u64 {
        self.ctx.pump_started_ms
    }

    pub fn last_hour_started_ms(&self) -> u64 {
        self.time.last_hour_started()
    }

    /// The durable image of the current state.
    pub fn record(&self) -> PersistentRecord {
        PersistentRecord {
            statistics: self.stats.slots,
            pumped_total_ml: self.stats.pumped_total_ml,
            last_hour_started_ms: self.time.last_hour_started(),
            pump_started_ms: self.ctx.pump_started_ms,
            idle_started_ms: self.ctx.idle_started_ms,
            last_wet_ms: self.interlock.last_triggered(InterlockChannel::Wet),
            statistics_day: self.stats.current_day,
        }
    }

    /// Snapshot for the presentation layer.
    pub fn status(&self) -> StatusView {
        let now = self.ctx.now_ms;
        StatusView {
            now_ms: now,
            state: self.fsm.current_state(),
            today_ml: self.stats.today_ml(),
            yesterday_ml: self.stats.yesterday_ml(),
            pumped_total_ml: self.stats.pumped_total_ml,
            capacity_ml: self.config.container_capacity_ml,
            water_detected: self.ctx.sensors.water_detected,
            motion_detected: self.ctx.sensors.motion_detected,
            interlock_mask: self.interlock.active_mask(now),
            force_stop_active: self.interlock.is_active(InterlockChannel::ForceStop, now),
            last_wet_ms: self.interlock.last_triggered(InterlockChannel::Wet),
            pump_started_ms: self.ctx.pump_started_ms,
            held: self.ctx.sensors.buttons,
            backlight_on: self.backlight_on,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Zero statistics, re-anchor every checkpoint to `now`, forget the
    /// wet and force-stop history.
    fn full_reset(&mut self, now: u64) {
        self.stats.reset(clock::day_of_month(now));
        self.time.mark_hour(now);
        self.ctx.pump_started_ms = now;
        self.ctx.idle_started_ms = now;
        self.interlock.disarm(InterlockChannel::Wet);
        self.interlock.disarm(InterlockChannel::ForceStop);
    }

    /// Adopt a loaded record.  Checkpoints later than `now` (RTC set
    /// back while powered off) are pulled back to `now`.
    fn restore(&mut self, record: &PersistentRecord, now: u64) {
        let clamp = |t: u64, name: &str| {
            if t > now {
                warn!("ledger: {name} checkpoint {t} is in the future, using {now}");
                now
            } else {
                t
            }
        };
        self.stats = PumpStatistics {
            slots: record.statistics,
            pumped_total_ml: record.pumped_total_ml,
            current_day: record.statistics_day,
        };
        self.time.mark_hour(clamp(record.last_hour_started_ms, "hour"));
        self.ctx.pump_started_ms = clamp(record.pump_started_ms, "pump");
        self.ctx.idle_started_ms = clamp(record.idle_started_ms, "idle");
        self.interlock.restore(
            InterlockChannel::Wet,
            record.last_wet_ms.map(|t| clamp(t, "wet")),
        );
    }

    fn persist(&mut self, ledger: &mut Ledger<impl StoragePort>, sink: &mut impl EventSink) {
        if let Err(e) = ledger.store(&self.record()) {
            error!("ledger write failed: {e}");
            sink.emit(&AppEvent::LedgerWriteFailed(e));
        }
    }

    /// Stop a running cycle outside the normal update path.
    fn force_idle(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        hw.set_pump(false);
        sink.emit(&AppEvent::StateChanged {
            from: StateId::Pumping,
            to: StateId::Idle,
        });
    }

    fn take_cycle_report(&mut self, sink: &mut impl EventSink) {
        if let Some(report) = self.ctx.completed_cycle.take() {
            self.stats.record_pumped(report.delivered_ml);
            sink.emit(&AppEvent::CycleCompleted(report));
        }
    }

    fn evaluate_interlock(&mut self, sink: &mut impl EventSink) {
        let previous = self.interlock_mask;
        let mask = self.interlock.evaluate(self.ctx.now_ms);
        for ch in InterlockChannel::ALL {
            let was = previous & ch.mask() != 0;
            let is = mask & ch.mask() != 0;
            if is && !was {
                sink.emit(&AppEvent::InterlockArmed(ch));
            } else if was && !is {
                sink.emit(&AppEvent::InterlockCleared(ch));
            }
        }
        self.interlock_mask = mask;
        self.ctx.interlock_active = mask != 0;
    }

    /// Latest timestamp already recorded anywhere; time is never
    /// corrected below it.
    fn latest_timestamp(&self) -> u64 {
        let triggers = InterlockChannel::ALL
            .iter()
            .filter_map(|ch| self.interlock.last_triggered(*ch));
        [
            self.ctx.pump_started_ms,
            self.ctx.idle_started_ms,
            self.time.last_hour_started(),
        ]
        .into_iter()
        .chain(triggers)
        .max()
        .unwrap_or(0)
    }
}
