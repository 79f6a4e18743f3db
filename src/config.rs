//! System configuration parameters
//!
//! All tunable parameters for the PlantWater appliance.
//! Values can be overridden via the persisted `config` document.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WateringConfig {
    // --- Doses ---
    /// Pump run time of a scheduled (large) watering, milliseconds
    pub long_dose_ms: u64,
    /// Pump run time of a manual (small) watering, milliseconds
    pub short_dose_ms: u64,

    // --- Schedule ---
    /// Minimum time between two automatic waterings, milliseconds
    pub watering_period_ms: u64,
    /// Waterings allowed before automatic watering is refused (tank guard)
    pub safety_ceiling: i32,

    // --- Button ---
    /// Hold time at which a press counts as long, milliseconds
    pub long_press_ms: u64,

    // --- Timing ---
    /// Decision loop interval, milliseconds
    pub tick_interval_ms: u64,
    /// Delay between power-on and arming the controller, milliseconds
    pub startup_settle_ms: u64,
    /// Added to the persisted clock snapshot on restore, seconds
    pub clock_restore_offset_secs: i64,

    // --- Lights ---
    /// Drive level of all channels during the settle delay (0.0-1.0)
    pub boot_pulse_level: f32,
    /// Triangle periods of the idle animation played once armed
    pub idle_slow_blink_cycles: u16,
    /// Blink count signalling the end of a watering cycle
    pub completion_blink_times: u16,
    /// Blink count acknowledging a schedule reset
    pub acknowledge_blink_times: u16,
}

impl Default for WateringConfig {
    fn default() -> Self {
        Self {
            // Doses
            long_dose_ms: 25_000,  // ~500 mL
            short_dose_ms: 5_000,  // ~100 mL

            // Schedule
            watering_period_ms: 3_600_000, // 1 h
            safety_ceiling: 20,

            // Button
            long_press_ms: 3_000,

            // Timing
            tick_interval_ms: 30_000,
            startup_settle_ms: 10_000,
            clock_restore_offset_secs: 3_600,

            // Lights
            boot_pulse_level: 0.1,
            idle_slow_blink_cycles: 5,
            completion_blink_times: 3,
            acknowledge_blink_times: 5,
        }
    }
}

impl WateringConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1_000..=600_000).contains(&self.long_dose_ms) {
            return Err(ConfigError::ValidationFailed("long_dose_ms must be 1000–600000"));
        }
        if !(500..=self.long_dose_ms).contains(&self.short_dose_ms) {
            return Err(ConfigError::ValidationFailed(
                "short_dose_ms must be 500–long_dose_ms",
            ));
        }
        if self.watering_period_ms < 60_000 {
            return Err(ConfigError::ValidationFailed("watering_period_ms must be >= 60000"));
        }
        if !(0..=1_000).contains(&self.safety_ceiling) {
            return Err(ConfigError::ValidationFailed("safety_ceiling must be 0–1000"));
        }
        if !(500..=30_000).contains(&self.long_press_ms) {
            return Err(ConfigError::ValidationFailed("long_press_ms must be 500–30000"));
        }
        if !(1_000..=3_600_000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::ValidationFailed("tick_interval_ms must be 1000–3600000"));
        }
        if self.startup_settle_ms > 120_000 {
            return Err(ConfigError::ValidationFailed("startup_settle_ms must be <= 120000"));
        }
        if self.clock_restore_offset_secs.abs() > 86_400 {
            return Err(ConfigError::ValidationFailed(
                "clock_restore_offset_secs must be within one day",
            ));
        }
        if !(0.0..=1.0).contains(&self.boot_pulse_level) {
            return Err(ConfigError::ValidationFailed("boot_pulse_level must be 0.0–1.0"));
        }
        if self.completion_blink_times == 0 || self.acknowledge_blink_times == 0 {
            return Err(ConfigError::ValidationFailed("blink counts must be non-zero"));
        }
        Ok(())
    }
}
