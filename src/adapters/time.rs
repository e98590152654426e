//! ESP32 clock adapter.
//!
//! Implements [`ClockPort`]:
//!
//! - **`target_os = "espidf"`** — monotonic time from `esp_timer_get_time()`;
//!   wall time from `gettimeofday()`, which the RTC backs across resets.
//!   A wall clock earlier than 2020 is treated as not running.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` for the
//!   monotonic counter and `SystemTime` for the wall clock.

use crate::app::ports::ClockPort;

/// Unix seconds for 2020-01-01; anything earlier means the RTC lost time.
#[cfg(target_os = "espidf")]
const EPOCH_2020: i64 = 1_577_836_800;

pub struct Esp32ClockAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32ClockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32ClockAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl ClockPort for Esp32ClockAdapter {
    #[cfg(target_os = "espidf")]
    fn wall_clock_ms(&mut self) -> Option<u64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: gettimeofday writes into the provided struct only.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }
        let secs = u64::try_from(tv.tv_sec).ok()?;
        let millis = u64::try_from(tv.tv_usec).ok()? / 1000;
        Some(secs * 1000 + millis)
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_clock_ms(&mut self) -> Option<u64> {
        let since = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?;
        u64::try_from(since.as_millis()).ok()
    }

    #[cfg(target_os = "espidf")]
    fn monotonic_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads a free-running counter.
        u64::try_from(unsafe { esp_idf_svc::sys::esp_timer_get_time() }).unwrap_or(0) / 1000
    }

    #[cfg(not(target_os = "espidf"))]
    fn monotonic_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
