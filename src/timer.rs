//! Software timer service.
//!
//! The firmware has exactly one execution context: the main loop.  All
//! "later" work (animation frames, pump auto-stop, the 30 s decision tick)
//! is expressed as a timer in this queue, and the main loop drains due
//! timers in deadline order.  Nothing ever blocks.
//!
//! ```text
//!  schedule_once / schedule_periodic ──▶ ┌────────────┐
//!                                        │ TimerQueue │ ──▶ pop_due(now)
//!  cancel(id) ─────────────────────────▶ └────────────┘     (deadline, id, event)
//! ```
//!
//! Time is plain monotonic milliseconds supplied by the caller, which makes
//! the queue trivially drivable from tests with simulated time.

use core::fmt;

use heapless::Vec;

/// Maximum number of concurrently armed timers (stack-allocated).
pub const MAX_TIMERS: usize = 16;

/// Opaque handle returned when a timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u32);

/// Errors from [`TimerQueue`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Every slot is armed.
    Full,
    /// A periodic timer was requested with a zero period.
    ZeroPeriod,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "timer queue full"),
            Self::ZeroPeriod => write!(f, "periodic timer with zero period"),
        }
    }
}

/// A due timer handed back by [`TimerQueue::pop_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// The instant the timer was scheduled for (may be earlier than `now`).
    pub deadline_ms: u64,
    pub event: E,
}

#[derive(Debug, Clone, Copy)]
struct Slot<E> {
    id: TimerId,
    deadline_ms: u64,
    period_ms: Option<u64>,
    event: E,
}

/// Fixed-capacity queue of one-shot and periodic timers.
pub struct TimerQueue<E> {
    slots: Vec<Slot<E>, MAX_TIMERS>,
    next_id: u32,
}

impl<E: Copy> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Copy> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 1,
        }
    }

    /// Arm a timer that fires once, `delay_ms` after `now_ms`.
    pub fn schedule_once(&mut self, now_ms: u64, delay_ms: u64, event: E) -> Result<TimerId, TimerError> {
        self.insert(now_ms.saturating_add(delay_ms), None, event)
    }

    /// Arm a timer that fires every `period_ms`, first at `now_ms + period_ms`.
    pub fn schedule_periodic(
        &mut self,
        now_ms: u64,
        period_ms: u64,
        event: E,
    ) -> Result<TimerId, TimerError> {
        if period_ms == 0 {
            return Err(TimerError::ZeroPeriod);
        }
        self.insert(now_ms.saturating_add(period_ms), Some(period_ms), event)
    }

    /// Disarm a timer.  Returns `false` if it was not armed (already fired
    /// or cancelled), which is never an error.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.slots.iter().position(|s| s.id == id) {
            Some(idx) => {
                self.slots.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.slots.iter().any(|s| s.id == id)
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Earliest armed deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().map(|s| s.deadline_ms).min()
    }

    /// Pop the earliest timer whose deadline is `<= now_ms`.
    ///
    /// Ties are broken by arming order.  One-shot timers are removed;
    /// periodic timers are re-armed one period after their deadline, so a
    /// late caller sees every missed period in order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<E>> {
        let idx = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.deadline_ms <= now_ms)
            .min_by_key(|(_, s)| (s.deadline_ms, s.id.0))
            .map(|(i, _)| i)?;

        let slot = self.slots[idx];
        match slot.period_ms {
            Some(period) => self.slots[idx].deadline_ms = slot.deadline_ms.saturating_add(period),
            None => {
                self.slots.swap_remove(idx);
            }
        }

        Some(Fired {
            id: slot.id,
            deadline_ms: slot.deadline_ms,
            event: slot.event,
        })
    }

    fn insert(&mut self, deadline_ms: u64, period_ms: Option<u64>, event: E) -> Result<TimerId, TimerError> {
        let id = TimerId(self.next_id);
        self.slots
            .push(Slot {
                id,
                deadline_ms,
                period_ms,
                event,
            })
            .map_err(|_| TimerError::Full)?;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        Ok(id)
    }
}
