//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the orchestration rules for the controller:
//! command application, strategy dispatch, and cycle cadence. All
//! interaction with hardware and transport happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals or a broker connection.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
