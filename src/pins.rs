//! GPIO / peripheral pin assignments for the PlantWater controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Pump (logic-level MOSFET, active HIGH)
// ---------------------------------------------------------------------------

/// Digital output switching the pump MOSFET.
pub const PUMP_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Indicator lights (three LEDC channels)
// ---------------------------------------------------------------------------

/// Light channel 1 — the first progress-bar segment.
pub const LIGHT_1_GPIO: i32 = 5;
/// Light channel 2.
pub const LIGHT_2_GPIO: i32 = 6;
/// Light channel 3 — the last progress-bar segment.
pub const LIGHT_3_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC frequency for the indicator lights (1 kHz).
pub const LIGHT_PWM_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// User button (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button: short press waters / aborts, long press resets.
pub const BUTTON_GPIO: i32 = 16;
/// Level read while the button is held.
pub const BUTTON_ACTIVE_HIGH: bool = false;

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

/// Upper bound on the main-loop sleep, so button sampling stays responsive.
pub const MAIN_LOOP_MAX_SLEEP_MS: u32 = 10;
