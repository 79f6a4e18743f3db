//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules of the watering controller:
//! pump cycles, light animations, the watering schedule, clock snapshot
//! persistence and the coordinator that sequences them.  All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod button;
pub mod commands;
pub mod coordinator;
pub mod events;
pub mod lights;
pub mod ports;
pub mod pump;
pub mod schedule;
pub mod timekeeper;
