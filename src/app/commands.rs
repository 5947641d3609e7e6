//! Inbound command updates.
//!
//! The transport layer delivers JSON objects in which every field is
//! optional; each present field is applied independently and a
//! malformed field fails only itself — one bad value must never poison
//! the rest of the update. Unknown keys are ignored. That is why
//! parsing goes field-by-field through [`serde_json::Value`] rather
//! than a derived struct deserialize, which would reject the whole
//! payload on the first bad field.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::mode::ControlMode;
use crate::control::pid::PidGains;
use crate::error::{CommandError, Error, Result};

/// An optional-field update record from the command channel.
///
/// Absent (`None`) fields leave the corresponding configuration
/// untouched when applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandUpdate {
    pub mode: Option<ControlMode>,
    pub temperature_setpoint: Option<f32>,
    pub turbidity_setpoint: Option<f32>,
    pub temperature_gains: Option<PidGains>,
    pub turbidity_gains: Option<PidGains>,
    pub calibration_clear: Option<i32>,
    pub calibration_turbid: Option<i32>,
}

impl CommandUpdate {
    /// Parse a JSON payload, extracting each field independently.
    ///
    /// Errors only when the payload is not a JSON object at all; any
    /// malformed *field* is dropped (with a warning) and the rest of
    /// the update survives. An unrecognized `mode` string is likewise
    /// dropped so the caller retains its current mode.
    pub fn from_json(payload: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(payload)
            .map_err(|_| Error::Command(CommandError::MalformedPayload))?;
        let obj = doc
            .as_object()
            .ok_or(Error::Command(CommandError::MalformedPayload))?;

        let mut update = Self::default();

        if let Some(v) = obj.get("mode") {
            match v.as_str().and_then(ControlMode::parse) {
                Some(mode) => update.mode = Some(mode),
                None => warn!("ignoring unrecognized mode field: {v}"),
            }
        }

        update.temperature_setpoint = field_f32(obj, "temperature_setpoint");
        update.turbidity_setpoint = field_f32(obj, "turbidity_setpoint");
        update.temperature_gains = field_gains(obj, "temperature_gains");
        update.turbidity_gains = field_gains(obj, "turbidity_gains");
        update.calibration_clear = field_i32(obj, "calibration_clear");
        update.calibration_turbid = field_i32(obj, "calibration_turbid");

        Ok(update)
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay `newer` on top of `self`: present fields in `newer` win.
    /// Used to coalesce commands queued between control cycles.
    pub fn merge(&mut self, newer: Self) {
        if newer.mode.is_some() {
            self.mode = newer.mode;
        }
        if newer.temperature_setpoint.is_some() {
            self.temperature_setpoint = newer.temperature_setpoint;
        }
        if newer.turbidity_setpoint.is_some() {
            self.turbidity_setpoint = newer.turbidity_setpoint;
        }
        if newer.temperature_gains.is_some() {
            self.temperature_gains = newer.temperature_gains;
        }
        if newer.turbidity_gains.is_some() {
            self.turbidity_gains = newer.turbidity_gains;
        }
        if newer.calibration_clear.is_some() {
            self.calibration_clear = newer.calibration_clear;
        }
        if newer.calibration_turbid.is_some() {
            self.calibration_turbid = newer.calibration_turbid;
        }
    }
}

fn field_f32(obj: &serde_json::Map<String, Value>, key: &str) -> Option<f32> {
    let v = obj.get(key)?;
    match v.as_f64() {
        Some(f) if f.is_finite() => Some(f as f32),
        _ => {
            warn!("ignoring malformed {key} field: {v}");
            None
        }
    }
}

fn field_i32(obj: &serde_json::Map<String, Value>, key: &str) -> Option<i32> {
    let v = obj.get(key)?;
    match v.as_i64() {
        Some(i) if i32::try_from(i).is_ok() => Some(i as i32),
        _ => {
            warn!("ignoring malformed {key} field: {v}");
            None
        }
    }
}

fn field_gains(obj: &serde_json::Map<String, Value>, key: &str) -> Option<PidGains> {
    let v = obj.get(key)?;
    let g = v.as_object()?;
    let kp = g.get("kp")?.as_f64()?;
    let ki = g.get("ki")?.as_f64()?;
    let kd = g.get("kd")?.as_f64()?;
    if !(kp.is_finite() && ki.is_finite() && kd.is_finite()) {
        warn!("ignoring non-finite {key} field");
        return None;
    }
    Some(PidGains {
        kp: kp as f32,
        ki: ki as f32,
        kd: kd as f32,
    })
}
