//! Polled, debounced button driver producing press/release edges.
//!
//! ## Hardware
//!
//! Momentary switch on [`BUTTON_GPIO`](crate::pins::BUTTON_GPIO).  The main
//! loop samples the pin level every iteration and feeds it to
//! [`ButtonDriver::tick`], which runs the debounce state machine.
//!
//! ## Debounce
//!
//! A level change must stay stable for [`DEBOUNCE_MS`] before the edge is
//! reported.  Both edges are confirmed with the same delay, so the held
//! duration measured between them is unaffected.
//!
//! Gesture classification (short vs long) is domain logic and lives in
//! [`PressWindow`](crate::app::button::PressWindow).

pub const DEBOUNCE_MS: u64 = 50;

/// A debounced transition of the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Stable { pressed: bool },
    Settling { pressed: bool, since_ms: u64 },
}

pub struct ButtonDriver {
    gpio: i32,
    state: DebounceState,
}

impl ButtonDriver {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            state: DebounceState::Stable { pressed: false },
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Feed one level sample.  `pressed` is the logical (already polarity
    /// corrected) level.  Returns an edge once a change has been stable for
    /// [`DEBOUNCE_MS`].
    pub fn tick(&mut self, now_ms: u64, pressed: bool) -> Option<ButtonEdge> {
        match self.state {
            DebounceState::Stable { pressed: stable } => {
                if pressed != stable {
                    self.state = DebounceState::Settling {
                        pressed,
                        since_ms: now_ms,
                    };
                }
                None
            }

            DebounceState::Settling {
                pressed: target,
                since_ms,
            } => {
                if pressed != target {
                    // Bounced back before settling.
                    self.state = DebounceState::Stable { pressed };
                    return None;
                }
                if now_ms.saturating_sub(since_ms) < DEBOUNCE_MS {
                    return None;
                }
                self.state = DebounceState::Stable { pressed };
                Some(if pressed {
                    ButtonEdge::Pressed
                } else {
                    ButtonEdge::Released
                })
            }
        }
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        match self.state {
            DebounceState::Stable { pressed } => pressed,
            DebounceState::Settling { pressed, .. } => !pressed,
        }
    }
}
