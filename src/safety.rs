//! Safety interlock.
//!
//! Three independent channels can forbid pumping for a fixed cooldown
//! after they fire:
//!
//! | Channel      | Source                              | Cooldown |
//! |--------------|-------------------------------------|----------|
//! | `Wet`        | water seen at the max-level sensor  | 1 h      |
//! | `ForceStop`  | user pressed the force-stop button  | 1 h      |
//! | `MotionStop` | motion sensor tripped               | 15 min   |
//!
//! A channel that has never fired never blocks.  Once fired at `t` it
//! blocks for `now` in `[t, t + cooldown)`; the millisecond at
//! `t + cooldown` is already allowed.
//!
//! The service evaluates the interlock before every pump start and on
//! every tick while pumping, so an interlock that becomes active cuts a
//! running cycle short on the same tick.

use core::fmt;

use log::{info, warn};

/// One hour in milliseconds.
pub const ONE_HOUR_MS: u64 = 3_600_000;
/// One minute in milliseconds.
pub const ONE_MINUTE_MS: u64 = 60_000;

pub const WET_COOLDOWN_MS: u64 = ONE_HOUR_MS;
pub const FORCE_STOP_COOLDOWN_MS: u64 = ONE_HOUR_MS;
pub const MOTION_STOP_COOLDOWN_MS: u64 = 15 * ONE_MINUTE_MS;

/// Interlock channels.  Discriminants are bitmask values so several
/// active channels can be reported as one `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterlockChannel {
    Wet = 0b0000_0001,
    ForceStop = 0b0000_0010,
    MotionStop = 0b0000_0100,
}

impl InterlockChannel {
    pub const ALL: [Self; 3] = [Self::Wet, Self::ForceStop, Self::MotionStop];

    /// Return the bitmask for this channel.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    pub const fn cooldown_ms(self) -> u64 {
        match self {
            Self::Wet => WET_COOLDOWN_MS,
            Self::ForceStop => FORCE_STOP_COOLDOWN_MS,
            Self::MotionStop => MOTION_STOP_COOLDOWN_MS,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Wet => 0,
            Self::ForceStop => 1,
            Self::MotionStop => 2,
        }
    }
}

impl fmt::Display for InterlockChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wet => write!(f, "wet"),
            Self::ForceStop => write!(f, "force stop"),
            Self::MotionStop => write!(f, "motion stop"),
        }
    }
}

/// Trigger timestamps for every channel plus the last evaluated mask.
#[derive(Debug, Clone, Default)]
pub struct SafetyInterlock {
    /// `None` until the channel fires for the first time.
    triggers: [Option<u64>; 3],
    /// Mask from the last [`evaluate`](Self::evaluate) call, used only to
    /// log edges.
    active: u8,
}

impl SafetyInterlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire a channel at `now`, (re)starting its cooldown.
    pub fn trigger(&mut self, channel: InterlockChannel, now_ms: u64) {
        self.triggers[channel.index()] = Some(now_ms);
    }

    /// Restore a persisted trigger time (or leave the channel unarmed).
    pub fn restore(&mut self, channel: InterlockChannel, triggered_ms: Option<u64>) {
        self.triggers[channel.index()] = triggered_ms;
    }

    /// Forget a channel's history so it no longer blocks.
    pub fn disarm(&mut self, channel: InterlockChannel) {
        self.triggers[channel.index()] = None;
    }

    pub fn last_triggered(&self, channel: InterlockChannel) -> Option<u64> {
        self.triggers[channel.index()]
    }

    /// True while `channel` is inside its cooldown window.
    pub fn is_active(&self, channel: InterlockChannel, now_ms: u64) -> bool {
        self.triggers[channel.index()]
            .is_some_and(|t| now_ms.saturating_sub(t) < channel.cooldown_ms())
    }

    /// Bitmask of every channel currently inside its cooldown window.
    pub fn active_mask(&self, now_ms: u64) -> u8 {
        InterlockChannel::ALL
            .iter()
            .filter(|ch| self.is_active(**ch, now_ms))
            .fold(0, |mask, ch| mask | ch.mask())
    }

    /// Whether a pump cycle may start (or continue) at `now`.
    pub fn can_start(&self, now_ms: u64) -> bool {
        self.active_mask(now_ms) == 0
    }

    /// Recompute the active mask, logging channels that became active or
    /// expired since the previous call.
    pub fn evaluate(&mut self, now_ms: u64) -> u8 {
        let mask = self.active_mask(now_ms);
        let changed = mask ^ self.active;
        for ch in InterlockChannel::ALL {
            if changed & ch.mask() == 0 {
                continue;
            }
            if mask & ch.mask() != 0 {
                warn!("INTERLOCK SET: {ch} ({} min)", ch.cooldown_ms() / ONE_MINUTE_MS);
            } else {
                info!("INTERLOCK CLEARED: {ch}");
            }
        }
        self.active = mask;
        mask
    }
}
