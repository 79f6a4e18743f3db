//! Pump run/stop state with a single auto-stop timer.
//!
//! ```text
//!   Idle ──start(d)──▶ Running ──stop() / auto-stop after d──▶ Idle
//! ```
//!
//! Invariant: `running` is true iff an auto-stop timer is armed.  A pump
//! that cannot be given an auto-stop timer is never switched on.

use log::{info, warn};

use crate::timer::{TimerError, TimerId, TimerQueue};

use super::coordinator::TimerEvent;
use super::ports::{ActuatorPort, Line};

pub struct PumpCycle {
    auto_stop: Option<TimerId>,
}

impl Default for PumpCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpCycle {
    pub fn new() -> Self {
        Self { auto_stop: None }
    }

    /// Run the pump for `duration_ms`.  Starting while running replaces the
    /// pending auto-stop rather than leaking it.
    pub fn start(
        &mut self,
        duration_ms: u64,
        now_ms: u64,
        timers: &mut TimerQueue<TimerEvent>,
        hw: &mut impl ActuatorPort,
    ) -> Result<(), TimerError> {
        if let Some(prev) = self.auto_stop.take() {
            timers.cancel(prev);
        }
        let id = match timers.schedule_once(now_ms, duration_ms, TimerEvent::PumpAutoStop) {
            Ok(id) => id,
            Err(e) => {
                warn!("Pump: no auto-stop timer available ({}), refusing to start", e);
                hw.write_digital(Line::Pump, false);
                return Err(e);
            }
        };
        self.auto_stop = Some(id);
        hw.write_digital(Line::Pump, true);
        info!("Pump: on for {} ms", duration_ms);
        Ok(())
    }

    /// Switch the pump off.  Returns `false` (and does nothing) if it was
    /// not running.
    pub fn stop(&mut self, timers: &mut TimerQueue<TimerEvent>, hw: &mut impl ActuatorPort) -> bool {
        let Some(id) = self.auto_stop.take() else {
            return false;
        };
        timers.cancel(id);
        hw.write_digital(Line::Pump, false);
        info!("Pump: off");
        true
    }

    /// Handle the auto-stop timer.  Ids that are not the pending auto-stop
    /// (already replaced or cancelled) are ignored.
    pub fn on_auto_stop(&mut self, id: TimerId, hw: &mut impl ActuatorPort) -> bool {
        if self.auto_stop != Some(id) {
            return false;
        }
        self.auto_stop = None;
        hw.write_digital(Line::Pump, false);
        info!("Pump: auto-stop");
        true
    }

    pub fn is_running(&self) -> bool {
        self.auto_stop.is_some()
    }
}
