//! Temperature PID engine.
//!
//! Classic PID with three refinements observed to matter on a slow
//! thermal plant:
//!
//! - **anti-windup**: the integral accumulator is clamped to a symmetric
//!   bound so sustained error cannot wind it up;
//! - **integral bleed**: on an error sign crossing the accumulator is
//!   halved (partial bleed, not full reset) to curb overshoot after a
//!   disturbance reversal;
//! - **derivative filtering**: the raw derivative passes through a
//!   first-order low-pass (`0.3·raw + 0.7·prev`) persisted in state.
//!
//! All accumulator state lives on the struct — constructed once, reset
//! on mode transitions, mutated on every [`PidController::compute`].

use serde::{Deserialize, Serialize};

/// Smallest elapsed time accepted between evaluations (guards the
/// derivative term against zero or negative clock deltas).
const MIN_DT_MS: u64 = 1;

/// Low-pass blend factor for the raw derivative.
const DERIVATIVE_LPF_ALPHA: f32 = 0.3;

/// Integral scale applied when the error changes sign.
const CROSSING_BLEED: f32 = 0.5;

/// Proportional / integral / derivative gains.
///
/// No implicit bounds: zero or negative `ki`/`kd` are tolerated and must
/// never produce NaN or infinity downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// Stateful PID controller for the heater loop.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    /// Symmetric anti-windup bound on the integral accumulator.
    integral_limit: f32,
    integral: f32,
    last_error: f32,
    last_time_ms: u64,
    filtered_derivative: f32,
}

impl PidController {
    pub fn new(gains: PidGains, integral_limit: f32, now_ms: u64) -> Self {
        Self {
            gains,
            integral_limit,
            integral: 0.0,
            last_error: 0.0,
            last_time_ms: now_ms,
            filtered_derivative: 0.0,
        }
    }

    /// Replace the gains without touching accumulator state.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Current integral accumulator (tests, diagnostics).
    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    /// Evaluate one PID step. `now_ms` is a monotonic millisecond clock;
    /// output is an actuation level in [0, 100].
    pub fn compute(&mut self, error: f32, now_ms: u64) -> f32 {
        let elapsed_ms = now_ms.saturating_sub(self.last_time_ms).max(MIN_DT_MS);
        let dt = elapsed_ms as f32 / 1000.0;

        let p = self.gains.kp * error;

        self.integral += error * dt;
        self.integral = self
            .integral
            .clamp(-self.integral_limit, self.integral_limit);

        // Partial bleed when the error crosses the setpoint.
        if sign_crossed(error, self.last_error) {
            self.integral *= CROSSING_BLEED;
        }

        let i = self.gains.ki * self.integral;

        let raw_derivative = (error - self.last_error) / dt;
        self.filtered_derivative = DERIVATIVE_LPF_ALPHA * raw_derivative
            + (1.0 - DERIVATIVE_LPF_ALPHA) * self.filtered_derivative;
        let d = self.gains.kd * self.filtered_derivative;

        self.last_error = error;
        self.last_time_ms = now_ms;

        (p + i + d).clamp(0.0, 100.0)
    }

    /// Zero all accumulator state. Called on every mode transition so a
    /// freshly (re)activated PID never sees stale history.
    pub fn reset(&mut self, now_ms: u64) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.filtered_derivative = 0.0;
        self.last_time_ms = now_ms;
    }
}

/// True when `a` and `b` lie strictly on opposite sides of zero.
pub(crate) fn sign_crossed(a: f32, b: f32) -> bool {
    (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn integral_bounded_for_any_input_sequence(
            errors in proptest::collection::vec(-200.0f32..200.0, 1..100),
            steps in proptest::collection::vec(1u64..10_000, 1..100),
        ) {
            let mut pid = PidController::new(
                PidGains { kp: 8.0, ki: 0.3, kd: 6.0 },
                20.0,
                0,
            );
            let mut now = 0u64;
            for (e, dt) in errors.iter().zip(steps.iter().cycle()) {
                now += dt;
                let out = pid.compute(*e, now);
                prop_assert!(pid.integral().abs() <= 20.0 + 1e-3);
                prop_assert!(out.is_finite());
                prop_assert!((0.0..=100.0).contains(&out));
            }
        }
    }
}
