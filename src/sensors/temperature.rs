//! Temperature probe conditioning (DS18B20-class one-wire probe).
//!
//! The raw sample stream carries two fault shapes: the probe's
//! disconnected sentinel (−127.0) and NaN from a corrupted conversion.
//! Both substitute the last filtered value without touching filter
//! state, so the conditioned signal stays continuous across transient
//! faults. Valid samples pass through an exponential moving average.

use log::warn;

/// Sentinel the probe reports when disconnected.
pub const FAULT_SENTINEL: f32 = -127.0;

/// Conditioned value used before the first valid sample ever arrives.
pub const SAFE_DEFAULT_C: f32 = 25.0;

/// Exponential-moving-average filter with fault substitution.
#[derive(Debug, Clone)]
pub struct TemperatureFilter {
    /// Smoothing factor: `filtered = α·raw + (1−α)·prev`.
    alpha: f32,
    /// `None` until the first valid sample seeds the filter.
    filtered: Option<f32>,
}

impl TemperatureFilter {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            filtered: None,
        }
    }

    /// Condition one raw sample and return the filtered temperature.
    ///
    /// Fault samples return the last filtered value unchanged (or
    /// [`SAFE_DEFAULT_C`] if no valid sample has ever arrived) and do
    /// not update filter state.
    pub fn update(&mut self, raw: f32) -> f32 {
        if Self::is_fault(raw) {
            warn!("temperature probe fault (raw={raw}), holding last value");
            return self.filtered.unwrap_or(SAFE_DEFAULT_C);
        }

        let next = match self.filtered {
            // First valid sample seeds the filter — no warm-up bias.
            None => raw,
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
        };
        self.filtered = Some(next);
        next
    }

    /// Last conditioned value, if any valid sample has arrived.
    pub fn value(&self) -> Option<f32> {
        self.filtered
    }

    fn is_fault(raw: f32) -> bool {
        raw.is_nan() || (raw - FAULT_SENTINEL).abs() < 0.5
    }
}
