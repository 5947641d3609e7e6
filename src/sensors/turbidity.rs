//! Turbidity sensor conditioning (analog sensor behind a 15-bit ADC).
//!
//! Raw ADC counts are noisy, so each reading averages a burst of
//! consecutive samples, clamping every sample into the converter's
//! valid range before accumulation. A two-point calibration then maps
//! counts to a 0-100 % turbidity figure.
//!
//! The percent mapping is a single closed-form affine expression rather
//! than a branch per calibration ordering: it is correct whether the
//! clear-water reference reads higher or lower than the turbid one.

/// Highest count the 15-bit ADC can produce.
pub const ADC_MAX: i32 = 32767;

use crate::config::TurbidityCalibration;

/// Burst-averaging conditioner; remembers the last averaged value so a
/// faulty burst can be substituted upstream.
#[derive(Debug, Clone)]
pub struct TurbidityConditioner {
    last_adc: i32,
}

impl TurbidityConditioner {
    pub fn new() -> Self {
        Self { last_adc: 0 }
    }

    /// Average a burst of raw samples into one ADC reading.
    ///
    /// Each sample is clamped to `[0, ADC_MAX]` before accumulation.
    /// An empty burst returns the last known value.
    pub fn average(&mut self, samples: &[i16]) -> i32 {
        if samples.is_empty() {
            return self.last_adc;
        }
        let sum: i64 = samples
            .iter()
            .map(|&s| i64::from((i32::from(s)).clamp(0, ADC_MAX)))
            .sum();
        let avg = (sum / samples.len() as i64) as i32;
        self.last_adc = avg;
        avg
    }

    /// Last averaged ADC value.
    pub fn last_adc(&self) -> i32 {
        self.last_adc
    }
}

impl Default for TurbidityConditioner {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an averaged ADC count to 0-100 % turbidity using the two-point
/// calibration: `adc_turbid` → 100 %, `adc_clear` → 0 %, clamped.
///
/// Direction-agnostic by construction — the affine form handles either
/// ordering of the calibration points without branching. A degenerate
/// calibration (both points equal) reads as 0 %.
pub fn to_percent(adc: i32, calib: &TurbidityCalibration) -> f32 {
    let span = calib.adc_turbid - calib.adc_clear;
    if span == 0 {
        return 0.0;
    }
    let percent = 100.0 * (adc - calib.adc_clear) as f32 / span as f32;
    percent.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_uniform_burst() {
        let mut c = TurbidityConditioner::new();
        let samples = [5000i16; 20];
        assert_eq!(c.average(&samples), 5000);
        assert_eq!(c.last_adc(), 5000);
    }

    #[test]
    fn negative_samples_clamp_to_zero() {
        let mut c = TurbidityConditioner::new();
        // Two bad samples dragged to 0, rest at 100 → (18·100)/20 = 90.
        let mut samples = [100i16; 20];
        samples[0] = -500;
        samples[1] = -1;
        assert_eq!(c.average(&samples), 90);
    }

    #[test]
    fn empty_burst_returns_last_known() {
        let mut c = TurbidityConditioner::new();
        c.average(&[4000; 20]);
        assert_eq!(c.average(&[]), 4000);
    }

    #[test]
    fn percent_hits_both_calibration_points() {
        let calib = TurbidityCalibration {
            adc_clear: 9475,
            adc_turbid: 3550,
        };
        assert_eq!(to_percent(9475, &calib), 0.0);
        assert_eq!(to_percent(3550, &calib), 100.0);
    }

    #[test]
    fn percent_is_order_invariant() {
        // Same physical curve whichever reference is numerically larger:
        // halfway between the references always reads 50 %.
        let inverted = TurbidityCalibration {
            adc_clear: 9475,
            adc_turbid: 3550,
        };
        let upright = TurbidityCalibration {
            adc_clear: 3550,
            adc_turbid: 9475,
        };
        let mid = (9475 + 3550) / 2;
        assert!((to_percent(mid, &inverted) - 50.0).abs() < 0.05);
        assert!((to_percent(mid, &upright) - 50.0).abs() < 0.05);

        // And a quarter of the way from clear reads 25 % in both.
        let q_inv = 9475 - (9475 - 3550) / 4;
        let q_up = 3550 + (9475 - 3550) / 4;
        assert!((to_percent(q_inv, &inverted) - 25.0).abs() < 0.05);
        assert!((to_percent(q_up, &upright) - 25.0).abs() < 0.05);
    }

    #[test]
    fn percent_clamps_beyond_references() {
        let calib = TurbidityCalibration {
            adc_clear: 9475,
            adc_turbid: 3550,
        };
        assert_eq!(to_percent(12000, &calib), 0.0);
        assert_eq!(to_percent(0, &calib), 100.0);
    }

    #[test]
    fn degenerate_calibration_reads_zero() {
        let calib = TurbidityCalibration {
            adc_clear: 5000,
            adc_turbid: 5000,
        };
        let p = to_percent(4000, &calib);
        assert!(p.is_finite());
        assert_eq!(p, 0.0);
    }
}
