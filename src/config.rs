//! System configuration parameters
//!
//! All tunable parameters for the aquarium controller: setpoints, PID
//! gains, turbidity calibration, filter constants, and actuator mapping.
//! Every value can be overridden at runtime through the command channel
//! (see [`CommandUpdate`](crate::app::commands::CommandUpdate)); tuning
//! constants are data, not logic, so one engine implementation serves
//! every observed tuning variant.

use serde::{Deserialize, Serialize};

use crate::control::mode::ControlMode;
use crate::control::pid::PidGains;

/// Two-point turbidity calibration: raw ADC counts at a clear-water
/// reference and at a fully turbid reference. Direction-agnostic —
/// either value may be numerically larger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurbidityCalibration {
    /// ADC reading in clear water (maps to 0 % turbidity).
    pub adc_clear: i32,
    /// ADC reading in fully turbid water (maps to 100 % turbidity).
    pub adc_turbid: i32,
}

impl Default for TurbidityCalibration {
    fn default() -> Self {
        Self {
            adc_clear: 9475,
            adc_turbid: 3550,
        }
    }
}

/// Core controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    // --- Setpoints ---
    /// Target water temperature (Celsius)
    pub temperature_setpoint: f32,
    /// Target turbidity (0-100 %)
    pub turbidity_setpoint: f32,

    // --- Strategy ---
    /// Active control strategy, shared by both variables
    pub mode: ControlMode,

    // --- PID: temperature ---
    pub temperature_gains: PidGains,
    /// Symmetric anti-windup bound on the temperature integral term
    pub temperature_integral_limit: f32,

    // --- PID: turbidity ---
    pub turbidity_gains: PidGains,
    /// Symmetric anti-windup bound on the turbidity integral term
    pub turbidity_integral_limit: f32,
    /// |error| above which the turbidity PID enters turbo mode
    pub turbo_error_threshold: f32,
    /// Aggressive proportional gain used in turbo mode
    pub turbo_kp: f32,
    /// Constant baseline pump duty added to the turbidity PID sum (%)
    pub pump_feedforward_percent: f32,
    /// Turbidity measurement (%) at or below which the pump is cut off
    pub pump_cutoff_percent: f32,

    // --- Sensor conditioning ---
    /// EMA smoothing factor for the temperature filter (0-1)
    pub temperature_filter_alpha: f32,
    /// Number of raw ADC samples averaged per turbidity reading
    pub turbidity_sample_count: usize,
    /// Two-point ADC calibration for the turbidity sensor
    pub calibration: TurbidityCalibration,

    // --- Actuator mapping ---
    /// Logical percent below which the pump is held off (anti-stiction)
    pub pump_start_threshold_percent: f32,
    /// Lowest hardware duty that reliably spins the pump motor
    pub pump_min_physical_duty: u8,

    // --- Timing ---
    /// Control cycle period (milliseconds)
    pub control_interval_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            // Setpoints
            temperature_setpoint: 28.0,
            turbidity_setpoint: 10.0,

            // Strategy
            mode: ControlMode::Fuzzy,

            // PID: temperature
            temperature_gains: PidGains {
                kp: 8.0,
                ki: 0.3,
                kd: 6.0,
            },
            temperature_integral_limit: 20.0,

            // PID: turbidity
            turbidity_gains: PidGains {
                kp: 5.0,
                ki: 0.2,
                kd: 2.0,
            },
            turbidity_integral_limit: 30.0,
            turbo_error_threshold: 2.0,
            turbo_kp: 10.0,
            pump_feedforward_percent: 50.0,
            pump_cutoff_percent: 9.0,

            // Sensor conditioning
            temperature_filter_alpha: 0.2,
            turbidity_sample_count: 20,
            calibration: TurbidityCalibration::default(),

            // Actuator mapping
            pump_start_threshold_percent: 5.0,
            pump_min_physical_duty: 180,

            // Timing
            control_interval_ms: 1000, // 1 Hz research cadence
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = ControlConfig::default();
        assert!(c.temperature_setpoint > 0.0);
        assert!((0.0..=100.0).contains(&c.turbidity_setpoint));
        assert!(c.temperature_integral_limit > 0.0);
        assert!(c.turbidity_integral_limit > 0.0);
        assert!(c.turbo_error_threshold > 0.0);
        assert!(c.temperature_filter_alpha > 0.0 && c.temperature_filter_alpha < 1.0);
        assert!(c.turbidity_sample_count > 0);
        assert!(c.pump_start_threshold_percent > 0.0);
        assert!(c.pump_min_physical_duty > 0);
        assert!(c.control_interval_ms > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = ControlConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: ControlConfig = serde_json::from_str(&json).unwrap();
        assert!((c.temperature_setpoint - c2.temperature_setpoint).abs() < 0.001);
        assert_eq!(c.mode, c2.mode);
        assert_eq!(c.calibration, c2.calibration);
        assert_eq!(c.pump_min_physical_duty, c2.pump_min_physical_duty);
    }

    #[test]
    fn default_calibration_is_inverted() {
        // The stock sensor reads *lower* counts in turbid water; the
        // percent mapping must cope with either ordering.
        let c = TurbidityCalibration::default();
        assert!(c.adc_clear > c.adc_turbid);
    }

    #[test]
    fn cutoff_sits_below_setpoint() {
        let c = ControlConfig::default();
        assert!(
            c.pump_cutoff_percent < c.turbidity_setpoint,
            "cutoff must engage only below the turbidity setpoint"
        );
    }
}
