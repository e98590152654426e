//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  The service fills in time, the sensor snapshot and the
//! interlock verdict before each tick; handlers update the scheduler
//! timestamps and write actuator commands and per-tick reports back.

use crate::drivers::button::ButtonSet;
use crate::scheduler::DosingPlan;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by sensor hub)
// ---------------------------------------------------------------------------

/// Every input sampled once at the top of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    /// Water present at the max-level sensor.
    pub water_detected: bool,
    /// Motion sensor output high.
    pub motion_detected: bool,
    /// Buttons held down this tick.
    pub buttons: ButtonSet,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    pub pump_on: bool,
}

impl ActuatorCommands {
    /// All actuators off.
    pub fn all_off() -> Self {
        Self::default()
    }
}

/// Result of one finished pump run, produced by the Pumping exit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Volume delivered, from the actual run time.
    pub delivered_ml: u16,
    pub pumped_ms: u64,
    /// Cut short by the interlock rather than by the run timer.
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Internal time of the current tick (ms).
    pub now_ms: u64,

    // -- Inputs --
    pub sensors: SensorSnapshot,
    /// Some interlock channel forbids pumping this tick.
    pub interlock_active: bool,

    // -- Scheduler state --
    pub plan: DosingPlan,
    pub idle_started_ms: u64,
    pub pump_started_ms: u64,
    /// Sticky "water seen since the idle window (or pump run) began".
    pub seen_wet: bool,

    // -- Outputs --
    pub commands: ActuatorCommands,
    /// Set by the Pumping exit action; taken by the service.
    pub completed_cycle: Option<CycleReport>,
    /// Set when the idle window restarted without pumping.
    pub idle_window_restarted: bool,
}

impl FsmContext {
    /// Create a context with every timestamp at `now_ms`.
    pub fn new(plan: DosingPlan, now_ms: u64) -> Self {
        Self {
            now_ms,
            sensors: SensorSnapshot::default(),
            interlock_active: false,
            plan,
            idle_started_ms: now_ms,
            pump_started_ms: now_ms,
            seen_wet: false,
            commands: ActuatorCommands::all_off(),
            completed_cycle: None,
            idle_window_restarted: false,
        }
    }

    /// Time spent in the current idle window.
    pub fn idle_elapsed_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.idle_started_ms)
    }

    /// Time the pump has been running in the current (or last) cycle.
    pub fn pump_elapsed_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.pump_started_ms)
    }

    /// Re-arm the latch from the instantaneous water reading.
    pub fn rearm_latch(&mut self) {
        self.seen_wet = self.sensors.water_detected;
    }
}
