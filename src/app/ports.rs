//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Coordinator (domain)
//! ```
//!
//! Driven adapters (actuators, storage, clock, entropy, event sinks)
//! implement these traits.  The [`Coordinator`](super::coordinator::Coordinator)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! The domain components each take only the port they need
//! (`PumpCycle` and `LightAnimator` take an [`ActuatorPort`],
//! `WateringSchedule` a [`StoragePort`]); the coordinator takes a single
//! [`Platform`] value that satisfies all of them, which avoids juggling
//! several mutable borrows per call.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::WateringConfig;

// ───────────────────────────────────────────────────────────────
// Output lines
// ───────────────────────────────────────────────────────────────

/// One of the three indicator light channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    One,
    Two,
    Three,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::One, Channel::Two, Channel::Three];

    /// Zero-based index into per-channel arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Three => 2,
        }
    }

    /// The channel's label as printed on the board (1..=3).
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub const fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::One),
            1 => Some(Self::Two),
            2 => Some(Self::Three),
            _ => None,
        }
    }
}

/// A physical output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Pump,
    Light(Channel),
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
///
/// No error channel: actuation is assumed to always succeed, and adapters
/// log anything the underlying HAL reports.
pub trait ActuatorPort {
    /// Drive a line fully on or off.
    fn write_digital(&mut self, line: Line, on: bool);

    /// Drive a line at a continuous level in `[0.0, 1.0]`.
    fn write_analog(&mut self, line: Line, level: f32);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Durable key → JSON document storage surviving power loss.
///
/// Write operations MUST be atomic — no partial documents on power loss.
/// The ESP-IDF NVS API guarantees this natively.
pub trait StoragePort {
    /// Read a document.  `Ok(None)` means the key was never written.
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Replace a document atomically.
    fn write(&mut self, key: &str, document: &Value) -> Result<(), StorageError>;

    /// Delete a document.  Returns `Ok(())` even if the key didn't exist.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic uptime plus a settable wall clock.
pub trait ClockPort {
    /// Milliseconds since boot; never goes backwards.
    fn uptime_ms(&self) -> u64;

    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Set the wall clock.  Uptime is unaffected.
    fn set_system_time(&mut self, time: DateTime<Utc>) -> Result<(), ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Entropy port
// ───────────────────────────────────────────────────────────────

/// Source of non-cryptographic randomness (heartbeat channel choice).
pub trait EntropyPort {
    fn next_u32(&mut self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting and
/// reject invalid ranges with [`ConfigError::ValidationFailed`].
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`WateringConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<WateringConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &WateringConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Everything the coordinator needs from the outside world.
pub trait Platform: ActuatorPort + StoragePort + ClockPort + EntropyPort + EventSink {}

impl<T> Platform for T where T: ActuatorPort + StoragePort + ClockPort + EntropyPort + EventSink {}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage partition is full.
    Full,
    /// Stored bytes are not a valid document.
    Corrupted,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`ClockPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The requested time cannot be represented by the platform clock.
    OutOfRange,
    /// The platform refused to set the clock.
    IoError,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::Corrupted => write!(f, "document corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "time out of range"),
            Self::IoError => write!(f, "clock I/O error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Full => Self::StorageFull,
            StorageError::Corrupted => Self::Corrupted,
            StorageError::IoError => Self::IoError,
        }
    }
}
