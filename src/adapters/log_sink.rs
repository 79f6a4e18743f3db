//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production), one
//! tagged line per event.

use log::{info, warn};

use crate::app::events::{AppEvent, StopReason};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booting => info!("START | booting"),
            AppEvent::Armed { counter } => info!("START | armed, counter={}", counter),
            AppEvent::WateringStarted { dose, duration_ms } => {
                info!("PUMP  | {:?} dose for {} ms", dose, duration_ms);
            }
            AppEvent::PumpStopped(StopReason::Completed) => info!("PUMP  | stopped (completed)"),
            AppEvent::PumpStopped(StopReason::Aborted) => info!("PUMP  | stopped (aborted)"),
            AppEvent::WateringRecorded { counter, at } => {
                info!("WATER | recorded #{} at {}", counter, at.to_rfc3339());
            }
            AppEvent::ScheduleReset => info!("WATER | counter reset"),
            AppEvent::SafetyCeilingReached { counter } => {
                warn!("WATER | safety ceiling reached (counter={}), refusing", counter);
            }
            AppEvent::AnimationStarted(animation) => info!("LIGHT | {:?}", animation),
            AppEvent::Heartbeat(channel) => info!("LIGHT | heartbeat ch{}", channel.number()),
            AppEvent::ClockSet(time) => info!("TIME  | clock set to {}", time.to_rfc3339()),
            AppEvent::PersistFailed { key, error } => warn!("STORE | {} not persisted: {}", key, error),
        }
    }
}
