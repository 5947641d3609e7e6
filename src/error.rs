//! Unified error types for the controller core.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the control loop's error handling uniform. All variants are `Copy` so
//! they can be passed around without allocation. Note that nothing in
//! this module is fatal to the control cycle: sensor faults substitute
//! the last known-good value, and malformed command fields fail only
//! themselves. These types exist for the command-parse surface and for
//! transport adapters that want typed rejection reasons.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor returned a fault sentinel or out-of-range data.
    Sensor(SensorError),
    /// An inbound command could not be applied.
    Command(CommandError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The temperature probe reported its disconnected sentinel.
    ProbeDisconnected,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// Reading is NaN or otherwise non-numeric.
    NotANumber,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbeDisconnected => write!(f, "probe disconnected"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::NotANumber => write!(f, "reading is not a number"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The payload was not a JSON object.
    MalformedPayload,
    /// A `mode` field named a strategy this controller does not know.
    /// The previous mode is retained; the transport layer may log it.
    UnknownMode,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload => write!(f, "malformed payload"),
            Self::UnknownMode => write!(f, "unknown control mode"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
