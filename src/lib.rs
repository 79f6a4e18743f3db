//! PlantWater firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod timer;

mod error;
pub mod pins;

pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
