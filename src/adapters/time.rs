//! System clock adapter.
//!
//! Implements [`ClockPort`]: monotonic uptime plus a settable wall clock.
//!
//! - **`feature = "espidf"`** — uptime from `esp_timer_get_time()`
//!   (microsecond precision, monotonic); wall clock via
//!   `gettimeofday` / `settimeofday`.
//! - **host** — `std::time::Instant` for uptime and a wall-clock offset
//!   seeded from `SystemTime`, for host-side testing and simulation.

use chrono::{DateTime, Utc};
use log::info;

use crate::app::ports::{ClockError, ClockPort};

/// Clock adapter for the controller board.
pub struct SystemClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
    /// Wall-clock milliseconds at `start`.
    #[cfg(not(feature = "espidf"))]
    wall_at_start_ms: i64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    #[cfg(feature = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new() -> Self {
        let wall_at_start_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as i64);
        Self {
            start: std::time::Instant::now(),
            wall_at_start_ms,
        }
    }
}

#[cfg(feature = "espidf")]
impl ClockPort for SystemClock {
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    fn now(&self) -> DateTime<Utc> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return DateTime::UNIX_EPOCH;
        }
        DateTime::from_timestamp(tv.tv_sec as i64, (tv.tv_usec as u32) * 1_000).unwrap_or(DateTime::UNIX_EPOCH)
    }

    fn set_system_time(&mut self, time: DateTime<Utc>) -> Result<(), ClockError> {
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: time
                .timestamp()
                .try_into()
                .map_err(|_| ClockError::OutOfRange)?,
            tv_usec: time.timestamp_subsec_micros() as _,
        };
        if unsafe { esp_idf_svc::sys::settimeofday(&tv, core::ptr::null()) } != 0 {
            return Err(ClockError::IoError);
        }
        info!("SystemClock: wall clock set to {}", time.to_rfc3339());
        Ok(())
    }
}

#[cfg(not(feature = "espidf"))]
impl ClockPort for SystemClock {
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn now(&self) -> DateTime<Utc> {
        let ms = self.wall_at_start_ms.saturating_add(self.uptime_ms() as i64);
        DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
    }

    fn set_system_time(&mut self, time: DateTime<Utc>) -> Result<(), ClockError> {
        self.wall_at_start_ms = time
            .timestamp_millis()
            .checked_sub(self.uptime_ms() as i64)
            .ok_or(ClockError::OutOfRange)?;
        info!("SystemClock: wall clock set to {} (simulation)", time.to_rfc3339());
        Ok(())
    }
}
