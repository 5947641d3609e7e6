//! Port traits — the boundary between the control core and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (the ADC/one-wire sensor stack, the PWM motor driver,
//! the MQTT transport) implement these traits. The
//! [`ControlService`](super::service::ControlService) consumes them via
//! generics, so the decision engines never touch hardware directly and
//! the whole core tests with mock adapters.

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain raw samples.
/// Conditioning (filtering, averaging, calibration) happens in the
/// domain, not the adapter.
pub trait SensorPort {
    /// One raw temperature sample in Celsius. A disconnected probe
    /// reports the fault sentinel (−127.0) or NaN.
    fn read_temperature_raw(&mut self) -> f32;

    /// One raw turbidity ADC sample. The conditioner performs the
    /// multi-sample burst by calling this repeatedly; adapters may
    /// insert their inter-sample settling delay here.
    fn read_turbidity_raw(&mut self) -> i16;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
/// Duties are hardware-range (0-255); direction/enable pins are the
/// adapter's concern.
pub trait ActuatorPort {
    /// Drive the heater at the given PWM duty (0 = off).
    fn set_heater(&mut self, duty: u8);

    /// Drive the circulation/dosing pump at the given PWM duty (0 = off).
    fn set_pump(&mut self, duty: u8);

    /// Kill both actuators — orderly shutdown.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → telemetry / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go (serial log, MQTT publish, test
/// recorder).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
