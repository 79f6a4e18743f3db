//! Wall-clock snapshot persistence.
//!
//! The board has no battery-backed RTC.  The coordinator writes the current
//! time to [`CURRENT_TIME_KEY`] on every tick; after a reboot the snapshot
//! is read back and the system clock is set from it, so watering intervals
//! survive a power cycle with at most one tick of drift.
//!
//! The restore adds a fixed compensation (`clock_restore_offset_secs`,
//! default one hour).  It reproduces the field behaviour of earlier units
//! and is most likely a timezone artefact rather than real drift.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::ports::{ClockPort, StorageError, StoragePort};

pub const CURRENT_TIME_KEY: &str = "currentTime";

/// Persisted wall-clock snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTimeRecord {
    pub timestamp: DateTime<Utc>,
}

pub struct TimeKeeper {
    restore_offset: Duration,
}

impl TimeKeeper {
    pub fn new(restore_offset_secs: i64) -> Self {
        Self {
            restore_offset: Duration::seconds(restore_offset_secs),
        }
    }

    /// Set the clock from the persisted snapshot plus the restore offset.
    /// Returns the time the clock was set to, or `None` if there was no
    /// usable snapshot or the clock refused.
    ///
    /// `io` provides both the store and the clock, which share one adapter.
    pub fn restore(&self, io: &mut (impl StoragePort + ClockPort)) -> Option<DateTime<Utc>> {
        let record = match io.read(CURRENT_TIME_KEY) {
            Ok(Some(doc)) => match serde_json::from_value::<CurrentTimeRecord>(doc) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Time: stored snapshot corrupted ({})", e);
                    return None;
                }
            },
            Ok(None) => {
                info!("Time: no stored snapshot");
                return None;
            }
            Err(e) => {
                warn!("Time: snapshot read failed ({})", e);
                return None;
            }
        };

        let restored = record.timestamp + self.restore_offset;
        match io.set_system_time(restored) {
            Ok(()) => {
                info!("Time: clock restored to {}", restored);
                Some(restored)
            }
            Err(e) => {
                warn!("Time: clock restore failed ({})", e);
                None
            }
        }
    }

    /// Persist `now` as the current snapshot.
    pub fn snapshot(&self, now: DateTime<Utc>, store: &mut impl StoragePort) -> Result<(), StorageError> {
        let doc = serde_json::to_value(CurrentTimeRecord { timestamp: now })
            .map_err(|_| StorageError::Corrupted)?;
        store.write(CURRENT_TIME_KEY, &doc)
    }

    /// Set the clock to `time` and persist it as the snapshot.
    pub fn set_global_time(&self, time: DateTime<Utc>, io: &mut (impl StoragePort + ClockPort)) -> Result<(), Error> {
        io.set_system_time(time)?;
        self.snapshot(time, io)?;
        info!("Time: clock set to {}", time);
        Ok(())
    }
}
