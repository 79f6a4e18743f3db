//! Press-window tracking and short/long classification.
//!
//! The window opens on the press edge and is consumed by the release edge;
//! the held duration decides the gesture.

/// A classified button gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Short { held_ms: u64 },
    Long { held_ms: u64 },
}

pub struct PressWindow {
    pressed_at_ms: Option<u64>,
    long_press_ms: u64,
}

impl PressWindow {
    pub fn new(long_press_ms: u64) -> Self {
        Self {
            pressed_at_ms: None,
            long_press_ms,
        }
    }

    /// Open the window.  A second press without a release restarts it.
    pub fn press(&mut self, now_ms: u64) {
        self.pressed_at_ms = Some(now_ms);
    }

    /// Close the window and classify the gesture.  A release with no
    /// matching press yields `None`.
    pub fn release(&mut self, now_ms: u64) -> Option<Press> {
        let held_ms = now_ms.saturating_sub(self.pressed_at_ms.take()?);
        if held_ms < self.long_press_ms {
            Some(Press::Short { held_ms })
        } else {
            Some(Press::Long { held_ms })
        }
    }

    pub fn is_down(&self) -> bool {
        self.pressed_at_ms.is_some()
    }
}
