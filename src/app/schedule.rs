//! Watering schedule: last-watered time, watering counter and eligibility.
//!
//! The record is persisted as a small flat JSON document under
//! [`WATERING_KEY`]:
//!
//! ```json
//! { "timestamp": "2024-05-01T10:00:00Z", "counter": 3 }
//! ```
//!
//! The counter doubles as a tank-capacity guard: once it exceeds the safety
//! ceiling no automatic watering happens until [`WateringSchedule::reset`].
//! A counter of `-1` means "just reset"; the next watering counts as 0.
//! A reset also restarts the watering period from the reset time.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::ports::{StorageError, StoragePort};

pub const WATERING_KEY: &str = "wateringData";

/// Counter value written by a reset.
pub const RESET_COUNTER: i32 = -1;

/// Persisted watering state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WateringRecord {
    pub timestamp: DateTime<Utc>,
    pub counter: i32,
}

pub struct WateringSchedule {
    record: WateringRecord,
    safety_ceiling: i32,
}

impl WateringSchedule {
    /// Defaults until [`load`](Self::load): counter 0, last watered at `boot_time`.
    pub fn new(boot_time: DateTime<Utc>, safety_ceiling: i32) -> Self {
        Self {
            record: WateringRecord {
                timestamp: boot_time,
                counter: 0,
            },
            safety_ceiling,
        }
    }

    /// Replace the in-memory record with the persisted one, if any.
    ///
    /// A missing document is first boot, not an error.  An unreadable one
    /// is logged and the defaults are kept.
    pub fn load(&mut self, store: &impl StoragePort) -> bool {
        let doc = match store.read(WATERING_KEY) {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                info!("Schedule: no stored record, using defaults");
                return false;
            }
            Err(e) => {
                warn!("Schedule: read failed ({}), using defaults", e);
                return false;
            }
        };
        match serde_json::from_value::<WateringRecord>(doc) {
            Ok(record) if record.counter >= RESET_COUNTER => {
                info!(
                    "Schedule: restored counter={} last={}",
                    record.counter, record.timestamp
                );
                self.record = record;
                true
            }
            Ok(record) => {
                warn!("Schedule: stored counter {} invalid, using defaults", record.counter);
                false
            }
            Err(e) => {
                warn!("Schedule: stored record corrupted ({}), using defaults", e);
                false
            }
        }
    }

    /// Eligible when under the safety ceiling and at least `period_ms` has
    /// passed since the last watering.  A clock that moved backwards is
    /// never eligible.
    pub fn due_to_water(&self, period_ms: u64, now: DateTime<Utc>) -> bool {
        if self.ceiling_exceeded() {
            return false;
        }
        let elapsed = now.signed_duration_since(self.record.timestamp).num_milliseconds();
        elapsed >= 0 && elapsed as u64 >= period_ms
    }

    /// Count a watering at `now` and persist.  The in-memory state is
    /// updated even if persisting fails.
    pub fn record_watering(
        &mut self,
        now: DateTime<Utc>,
        store: &mut impl StoragePort,
    ) -> Result<i32, StorageError> {
        self.record.timestamp = now;
        self.record.counter = self.record.counter.saturating_add(1);
        self.persist(store)?;
        Ok(self.record.counter)
    }

    /// Set the counter to the reset sentinel, restart the period at `now`
    /// and persist immediately.
    pub fn reset(&mut self, now: DateTime<Utc>, store: &mut impl StoragePort) -> Result<(), StorageError> {
        self.record.timestamp = now;
        self.record.counter = RESET_COUNTER;
        info!("Schedule: counter reset at {}", now);
        self.persist(store)
    }

    pub fn ceiling_exceeded(&self) -> bool {
        self.record.counter > self.safety_ceiling
    }

    pub fn counter(&self) -> i32 {
        self.record.counter
    }

    pub fn last_watered(&self) -> DateTime<Utc> {
        self.record.timestamp
    }

    pub fn record(&self) -> WateringRecord {
        self.record
    }

    fn persist(&self, store: &mut impl StoragePort) -> Result<(), StorageError> {
        let doc = serde_json::to_value(self.record).map_err(|_| StorageError::Corrupted)?;
        store.write(WATERING_KEY, &doc)
    }
}
