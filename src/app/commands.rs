//! Inbound commands to the coordinator.
//!
//! Button gestures are translated into these, and the same commands are
//! available for programmatic control (serial console, tests).

use chrono::{DateTime, Utc};

use super::lights::Animation;

/// Named watering intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dose {
    /// Manual top-up from a short button press.
    Short,
    /// Scheduled watering from the periodic tick.
    Long,
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Run a watering cycle of the given dose unless the pump is already running.
    StartWatering(Dose),

    /// Stop the pump, all animations and the pending completion blink.
    Abort,

    /// Force-reset the watering counter and play the acknowledge blink.
    ResetSchedule,

    /// Replace the current light animation.
    RunAnimation(Animation),

    /// Turn every light off and drop the current animation.
    StopAnimations,

    /// Set the wall clock and persist the snapshot.
    SetTime(DateTime<Utc>),
}
