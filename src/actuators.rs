//! Actuator duty mapping.
//!
//! Control decisions are 0-100 % actuation levels; the L298N-class
//! driver wants an 8-bit PWM duty. The heater maps linearly. The pump
//! needs two corrections for the physics of a small DC motor:
//!
//! - below a logical start threshold the motor is held off — sub-
//!   threshold PWM buzzes audibly without producing rotation;
//! - at or above the threshold, the logical range is affine-remapped
//!   onto `[min_physical_duty, 255]`, because duties under the physical
//!   minimum stall against stiction.

/// Full-scale hardware PWM duty.
pub const DUTY_MAX: u8 = 255;

/// Linear percent → duty scaling for the heater (no remap; the driver's
/// direction pins are handled by the actuator adapter).
pub fn heater_duty(percent: f32) -> u8 {
    scale_linear(percent)
}

/// Dead-zone / anti-stiction mapper for the pump.
#[derive(Debug, Clone, Copy)]
pub struct PumpMapper {
    /// Logical percent below which the motor is held off.
    pub start_threshold_percent: f32,
    /// Lowest duty that reliably produces rotation.
    pub min_physical_duty: u8,
}

impl PumpMapper {
    pub fn new(start_threshold_percent: f32, min_physical_duty: u8) -> Self {
        Self {
            start_threshold_percent,
            min_physical_duty,
        }
    }

    /// Map a 0-100 % decision to a pump duty: 0 below the threshold,
    /// otherwise affine into `[min_physical_duty, 255]`.
    pub fn to_duty(&self, percent: f32) -> u8 {
        let percent = percent.clamp(0.0, 100.0);
        if percent < self.start_threshold_percent {
            return 0;
        }
        let logical_span = 100.0 - self.start_threshold_percent;
        if logical_span <= 0.0 {
            return DUTY_MAX;
        }
        let physical_span = f32::from(DUTY_MAX - self.min_physical_duty);
        let duty = f32::from(self.min_physical_duty)
            + (percent - self.start_threshold_percent) / logical_span * physical_span;
        duty.round().clamp(0.0, f32::from(DUTY_MAX)) as u8
    }
}

fn scale_linear(percent: f32) -> u8 {
    (percent.clamp(0.0, 100.0) * 2.55).round().clamp(0.0, 255.0) as u8
}
