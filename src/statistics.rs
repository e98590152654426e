//! Pumped-volume statistics.
//!
//! A 24-slot history of pumped millilitres (slot 0 = current day, newest
//! first) plus the running total since the container was last refilled.
//! Slots shift once per observed calendar-day change.

use log::info;
use serde::{Deserialize, Serialize};

/// Number of history slots.
pub const HISTORY_SLOTS: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpStatistics {
    pub slots: [u16; HISTORY_SLOTS],
    /// Pumped since the last container reset (mL).
    pub pumped_total_ml: u32,
    /// Day of month the current slot belongs to.
    pub current_day: u8,
}

impl Default for PumpStatistics {
    fn default() -> Self {
        Self {
            slots: [0; HISTORY_SLOTS],
            pumped_total_ml: 0,
            current_day: 0,
        }
    }
}

impl PumpStatistics {
    /// Fresh statistics stamped with `day`.
    pub fn new(day: u8) -> Self {
        Self {
            current_day: day,
            ..Self::default()
        }
    }

    /// Add one dosing cycle's volume to slot 0 and the running total.
    pub fn record_pumped(&mut self, ml: u16) {
        self.slots[0] = self.slots[0].saturating_add(ml);
        self.pumped_total_ml = self.pumped_total_ml.saturating_add(u32::from(ml));
    }

    /// Shift history one slot toward the oldest end and open a fresh slot 0.
    pub fn day_rollover(&mut self) {
        self.slots.copy_within(0..HISTORY_SLOTS - 1, 1);
        self.slots[0] = 0;
    }

    /// Roll over if `day` differs from the stamped day.  However many
    /// days passed unobserved, this shifts once.
    pub fn observe_day(&mut self, day: u8) -> bool {
        if day == self.current_day {
            return false;
        }
        info!("statistics: day {} -> {}, rolling history", self.current_day, day);
        self.day_rollover();
        self.current_day = day;
        true
    }

    /// Container refilled: zero the running total, keep history.
    pub fn reset_container(&mut self) {
        self.pumped_total_ml = 0;
    }

    /// Zero everything and stamp `day`.
    pub fn reset(&mut self, day: u8) {
        *self = Self::new(day);
    }

    /// Volume left in a container of `capacity_ml` (never negative).
    pub fn remaining_ml(&self, capacity_ml: u32) -> u32 {
        capacity_ml.saturating_sub(self.pumped_total_ml)
    }

    pub fn today_ml(&self) -> u16 {
        self.slots[0]
    }

    pub fn yesterday_ml(&self) -> u16 {
        self.slots[1]
    }
}
