//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (log to serial, record in tests).

use crate::error::LedgerError;
use crate::fsm::StateId;
use crate::fsm::context::CycleReport;
use crate::safety::InterlockChannel;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has booted (carries initial state).
    Started(StateId),

    /// The scheduler transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A pump run finished and its volume was recorded.
    CycleCompleted(CycleReport),

    /// The idle window elapsed but dosing was skipped.
    IdleWindowRestarted,

    /// A new calendar day opened a fresh statistics slot.
    DayRolledOver { day: u8 },

    /// Hourly drift correction applied (signed, ms).
    ClockCorrected { delta_ms: i64 },

    /// RTC not running at boot; time seeded from the build timestamp.
    ClockFallback,

    /// Storage held no usable ledger; a full reset was written.
    LedgerInitialised,

    /// Ledger loaded from storage.
    LedgerRestored,

    /// Storage could not be read at boot; running on fresh state.
    LedgerLoadFailed(LedgerError),

    /// A ledger write failed; in-memory state is ahead of storage.
    LedgerWriteFailed(LedgerError),

    InterlockArmed(InterlockChannel),
    InterlockCleared(InterlockChannel),

    ContainerReset,
    FactoryReset,
    BacklightToggled(bool),
    ForceStopRequested,
}
