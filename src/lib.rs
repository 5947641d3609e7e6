//! Aquarium water-quality control core.
//!
//! Closed-loop control of a heater and a circulation/dosing pump
//! against a temperature setpoint and a turbidity setpoint, with the
//! strategy selectable at runtime between fuzzy inference and PID. The
//! crate is the decision engine only: it consumes raw sensor samples
//! and command updates through port traits and produces actuator duty
//! commands — transport, drivers, and persistence live in adapters
//! behind the ports.

pub mod actuators;
pub mod app;
pub mod config;
pub mod control;
pub mod sensors;

mod error;

pub use error::{CommandError, Error, Result, SensorError};
