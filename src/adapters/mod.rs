//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements              | Connects to                    |
//! |------------|-------------------------|--------------------------------|
//! | `hardware` | ActuatorPort            | embedded-hal pin + 3 PWM chans |
//! | `nvs`      | StoragePort, ConfigPort | NVS / in-memory store          |
//! | `time`     | ClockPort               | esp_timer + system wall clock  |
//! | `entropy`  | EntropyPort             | hardware RNG via getrandom     |
//! | `log_sink` | EventSink               | Serial log output              |
//! | `board`    | all of the above        | bundles the adapters           |

pub mod board;
pub mod entropy;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
