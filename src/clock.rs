//! Controller time base.
//!
//! Internal timestamps are `u64` milliseconds since [`EPOCH_OFFSET_SECS`]
//! (Unix time).  They are produced by adding the monotonic counter to a
//! signed anchor taken from the real-time clock at boot:
//!
//! ```text
//!   now = anchor + monotonic_ms
//!   anchor = (wall_unix_ms − EPOCH_OFFSET·1000) − monotonic_ms_at_anchor
//! ```
//!
//! The monotonic counter drifts relative to the RTC, so once an hour
//! (and only while the pump is idle, since a moving anchor would corrupt
//! the measured pump run time) the anchor is re-aligned to the RTC at
//! whole-second resolution.  A correction never moves `now` below the
//! latest timestamp already recorded, so `now − t` stays non-negative for
//! every stored `t`.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use log::{info, warn};

use crate::safety::ONE_HOUR_MS;

/// Unix second that internal time zero corresponds to.
pub const EPOCH_OFFSET_SECS: u64 = 1_694_490_000;

/// Interval between drift corrections.
pub const CORRECTION_INTERVAL_MS: u64 = ONE_HOUR_MS;

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Unix milliseconds at which this firmware was built.
///
/// Seeds the anchor when the RTC is not running.
pub fn build_time_unix_ms() -> u64 {
    env!("PLANTWATER_BUILD_UNIX_SECS")
        .parse::<u64>()
        .unwrap_or(EPOCH_OFFSET_SECS)
        .saturating_mul(1000)
}

/// Wall-clock anchor plus the hourly correction checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeKeeper {
    anchor_ms: i64,
    last_hour_started_ms: u64,
}

impl TimeKeeper {
    /// Anchor internal time so that `now(monotonic_ms)` equals
    /// `wall_unix_ms` expressed on the internal epoch.
    pub fn anchored(wall_unix_ms: u64, monotonic_ms: u64) -> Self {
        let wall = to_i64(wall_unix_ms).saturating_sub(to_i64(EPOCH_OFFSET_SECS * 1000));
        let anchor_ms = wall.saturating_sub(to_i64(monotonic_ms));
        let mut keeper = Self {
            anchor_ms,
            last_hour_started_ms: 0,
        };
        keeper.last_hour_started_ms = keeper.now(monotonic_ms);
        keeper
    }

    /// Internal time for a monotonic reading.  Clamped at zero.
    pub fn now(&self, monotonic_ms: u64) -> u64 {
        u64::try_from(self.anchor_ms.saturating_add(to_i64(monotonic_ms))).unwrap_or(0)
    }

    pub fn last_hour_started(&self) -> u64 {
        self.last_hour_started_ms
    }

    /// Restore or re-stamp the correction checkpoint.
    pub fn mark_hour(&mut self, now_ms: u64) {
        self.last_hour_started_ms = now_ms;
    }

    /// More than one correction interval has elapsed since the checkpoint.
    pub fn correction_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_hour_started_ms) > CORRECTION_INTERVAL_MS
    }

    /// Re-align the anchor to an authoritative wall clock and advance the
    /// checkpoint.  Returns the signed adjustment actually applied (ms).
    ///
    /// The difference is taken in whole seconds.  If the corrected time
    /// would fall below `floor_ms` it is held at `floor_ms` instead.  With
    /// no authoritative reading only the checkpoint moves.
    pub fn correct(
        &mut self,
        authoritative_unix_ms: Option<u64>,
        monotonic_ms: u64,
        floor_ms: u64,
    ) -> i64 {
        let before = self.anchor_ms;
        if let Some(wall) = authoritative_unix_ms {
            let rtc_secs = to_i64(wall / 1000).saturating_sub(to_i64(EPOCH_OFFSET_SECS));
            let local_secs = to_i64(self.now(monotonic_ms) / 1000);
            let delta_ms = rtc_secs.saturating_sub(local_secs).saturating_mul(1000);
            self.anchor_ms = self.anchor_ms.saturating_add(delta_ms);

            let corrected = self.now(monotonic_ms);
            if corrected < floor_ms {
                warn!(
                    "clock: correction would rewind below {floor_ms}, holding at floor ({} ms short)",
                    floor_ms - corrected
                );
                self.anchor_ms = self
                    .anchor_ms
                    .saturating_add(to_i64(floor_ms - corrected));
            }
        } else {
            warn!("clock: RTC unavailable, skipping drift correction");
        }

        self.last_hour_started_ms = self.now(monotonic_ms);
        let applied = self.anchor_ms - before;
        if applied != 0 {
            info!("clock: corrected by {applied} ms");
        }
        applied
    }
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

/// Calendar date/time for an internal timestamp.
///
/// The RTC keeps local time, so the result is a naive (zone-less) value.
pub fn calendar(now_ms: u64) -> NaiveDateTime {
    let secs = to_i64(now_ms / 1000).saturating_add(to_i64(EPOCH_OFFSET_SECS));
    DateTime::from_timestamp(secs, 0)
        .unwrap_or_default()
        .naive_utc()
}

/// Day of month (1-31); the statistics rollover key.
#[allow(clippy::cast_possible_truncation)]
pub fn day_of_month(now_ms: u64) -> u8 {
    calendar(now_ms).day() as u8
}

/// `(hour, minute)` for the dashboard clock.
#[allow(clippy::cast_possible_truncation)]
pub fn hour_minute(now_ms: u64) -> (u8, u8) {
    let t = calendar(now_ms);
    (t.hour() as u8, t.minute() as u8)
}

/// Whole minutes between `then_ms` and `now_ms` (zero if `then` is later).
pub fn minutes_ago(now_ms: u64, then_ms: u64) -> u64 {
    now_ms.saturating_sub(then_ms) / crate::safety::ONE_MINUTE_MS
}
