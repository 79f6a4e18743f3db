//! Outbound application events.
//!
//! The [`Coordinator`](super::coordinator::Coordinator) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, count in tests, etc.

use chrono::{DateTime, Utc};

use super::commands::Dose;
use super::lights::Animation;
use super::ports::{Channel, StorageError};

/// Why the pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The auto-stop timer fired.
    Completed,
    /// A short press or an `Abort` command cut the cycle short.
    Aborted,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Power-on: lights pulsed, waiting for the settle delay.
    Booting,

    /// State restored, button armed, periodic tick running.
    Armed { counter: i32 },

    /// A watering cycle began.
    WateringStarted { dose: Dose, duration_ms: u64 },

    /// The pump stopped.
    PumpStopped(StopReason),

    /// A scheduled watering was counted and persisted.
    WateringRecorded { counter: i32, at: DateTime<Utc> },

    /// The watering counter was reset by a long press or command.
    ScheduleReset,

    /// Automatic watering is being refused until the counter is reset.
    SafetyCeilingReached { counter: i32 },

    /// A new light animation took over.
    AnimationStarted(Animation),

    /// Idle liveness blink.
    Heartbeat(Channel),

    /// The wall clock was set from the persisted snapshot or a command.
    ClockSet(DateTime<Utc>),

    /// A document could not be persisted; in-memory state is kept.
    PersistFailed { key: &'static str, error: StorageError },
}
