//! Turbidity PID engine — gain-scheduled variant with feedforward.
//!
//! Not a parametrization of [`PidController`](super::pid::PidController):
//! the pump loop has branch logic of its own and the two engines must
//! not be merged behind a single gain set.
//!
//! - **gain schedule**: above a configurable error magnitude the engine
//!   enters *turbo* mode — aggressive proportional gain, zero derivative
//!   gain, integral forced to zero — to clear a badly fouled tank fast;
//! - **feedforward**: a constant baseline duty is added to the sum,
//!   covering the steady-state drive the pump needs to maintain flow;
//! - **hard cutoff**: once the reconstructed measurement falls to the
//!   low-turbidity threshold the output is forced to zero (and the
//!   integral cleared) so the pump never churns already-clear water.

use super::pid::{sign_crossed, PidGains};

const MIN_DT_MS: u64 = 1;
const DERIVATIVE_LPF_ALPHA: f32 = 0.3;
const CROSSING_BLEED: f32 = 0.5;

/// Tuning for the scheduled turbidity loop, beyond the smooth-mode gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurbiditySchedule {
    /// |error| above which turbo mode engages.
    pub turbo_threshold: f32,
    /// Proportional gain while in turbo mode (Kd is forced to zero).
    pub turbo_kp: f32,
    /// Baseline duty (%) added to every computed sum.
    pub feedforward: f32,
    /// Measurement (%) at or below which the output is forced to zero.
    pub cutoff_percent: f32,
}

/// Stateful gain-scheduled PID controller for the pump loop.
#[derive(Debug, Clone)]
pub struct TurbidityPid {
    gains: PidGains,
    schedule: TurbiditySchedule,
    integral_limit: f32,
    integral: f32,
    last_error: f32,
    last_time_ms: u64,
    filtered_derivative: f32,
}

impl TurbidityPid {
    pub fn new(
        gains: PidGains,
        schedule: TurbiditySchedule,
        integral_limit: f32,
        now_ms: u64,
    ) -> Self {
        Self {
            gains,
            schedule,
            integral_limit,
            integral: 0.0,
            last_error: 0.0,
            last_time_ms: now_ms,
            filtered_derivative: 0.0,
        }
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn set_schedule(&mut self, schedule: TurbiditySchedule) {
        self.schedule = schedule;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    /// Whether the schedule would select turbo mode for `error`.
    pub fn is_turbo(&self, error: f32) -> bool {
        error.abs() > self.schedule.turbo_threshold
    }

    /// Evaluate one step. `error` is measurement − setpoint; `setpoint`
    /// is needed to reconstruct the absolute measurement for the cutoff.
    /// Output is a pump actuation level in [0, 100].
    pub fn compute(&mut self, error: f32, setpoint: f32, now_ms: u64) -> f32 {
        let elapsed_ms = now_ms.saturating_sub(self.last_time_ms).max(MIN_DT_MS);
        let dt = elapsed_ms as f32 / 1000.0;

        let turbo = self.is_turbo(error);
        let (kp, kd) = if turbo {
            (self.schedule.turbo_kp, 0.0)
        } else {
            (self.gains.kp, self.gains.kd)
        };

        let p = kp * error;

        if turbo {
            // Large error: pure aggressive P plus feedforward. Integral
            // history from the smooth region would only cause overshoot.
            self.integral = 0.0;
        } else {
            self.integral += error * dt;
            self.integral = self
                .integral
                .clamp(-self.integral_limit, self.integral_limit);
            if sign_crossed(error, self.last_error) {
                self.integral *= CROSSING_BLEED;
            }
        }
        let i = self.gains.ki * self.integral;

        let raw_derivative = (error - self.last_error) / dt;
        self.filtered_derivative = DERIVATIVE_LPF_ALPHA * raw_derivative
            + (1.0 - DERIVATIVE_LPF_ALPHA) * self.filtered_derivative;
        let d = kd * self.filtered_derivative;

        self.last_error = error;
        self.last_time_ms = now_ms;

        // Hard cutoff: water already clear, pump stays off no matter
        // what the sum says.
        if error + setpoint <= self.schedule.cutoff_percent {
            self.integral = 0.0;
            return 0.0;
        }

        (p + i + d + self.schedule.feedforward).clamp(0.0, 100.0)
    }

    /// Zero all accumulator state (mode transitions).
    pub fn reset(&mut self, now_ms: u64) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.filtered_derivative = 0.0;
        self.last_time_ms = now_ms;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn integral_bounded_and_output_sane(
            errors in proptest::collection::vec(-100.0f32..100.0, 1..80),
        ) {
            let mut pid = TurbidityPid::new(
                PidGains { kp: 5.0, ki: 0.2, kd: 2.0 },
                TurbiditySchedule {
                    turbo_threshold: 2.0,
                    turbo_kp: 10.0,
                    feedforward: 50.0,
                    cutoff_percent: 9.0,
                },
                30.0,
                0,
            );
            let mut now = 0u64;
            for e in errors {
                now += 1000;
                let out = pid.compute(e, 10.0, now);
                prop_assert!(pid.integral().abs() <= 30.0 + 1e-3);
                prop_assert!(out.is_finite());
                prop_assert!((0.0..=100.0).contains(&out));
            }
        }
    }
}
