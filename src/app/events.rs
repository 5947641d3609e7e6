//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them — log to serial, publish
//! over MQTT, record in a test.

use serde::Serialize;

use crate::control::mode::ControlMode;

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Per-cycle telemetry snapshot.
    Telemetry(TelemetrySnapshot),

    /// The active strategy changed (PID state was reset).
    ModeChanged {
        from: ControlMode,
        to: ControlMode,
    },

    /// The service has started (carries the initial mode).
    Started(ControlMode),
}

/// A point-in-time snapshot of one control cycle — absolute values, not
/// deltas. Serializes to the JSON shape the transport publishes.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    /// Monotonic cycle timestamp (milliseconds).
    pub timestamp_ms: u64,
    /// Conditioned (EMA-filtered) temperature, Celsius.
    pub temperature_c: f32,
    /// Calibrated turbidity, 0-100 %.
    pub turbidity_percent: f32,
    /// Burst-averaged raw ADC counts behind the percent figure.
    pub turbidity_adc: i32,
    /// Active strategy label.
    pub mode: ControlMode,
    /// Heater decision, 0-100 % (not raw duty).
    pub heater_output_percent: f32,
    /// Pump decision, 0-100 % (not raw duty).
    pub pump_output_percent: f32,
    pub temperature_error: f32,
    pub turbidity_error: f32,
    pub temperature_setpoint: f32,
    pub turbidity_setpoint: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_with_wire_mode_label() {
        let snap = TelemetrySnapshot {
            timestamp_ms: 1000,
            temperature_c: 27.5,
            turbidity_percent: 12.0,
            turbidity_adc: 8000,
            mode: ControlMode::Pid,
            heater_output_percent: 42.0,
            pump_output_percent: 55.0,
            temperature_error: 0.5,
            turbidity_error: 2.0,
            temperature_setpoint: 28.0,
            turbidity_setpoint: 10.0,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"mode\":\"PID\""));
        assert!(json.contains("\"turbidity_adc\":8000"));
        assert!(json.contains("\"timestamp_ms\":1000"));
    }
}
