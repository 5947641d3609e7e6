//! Sensor conditioning.
//!
//! Raw samples come in through [`SensorPort`](crate::app::ports::SensorPort);
//! these modules turn them into trustworthy process values — EMA-filtered
//! temperature with fault substitution, burst-averaged and calibrated
//! turbidity. No I/O happens here.

pub mod temperature;
pub mod turbidity;

pub use temperature::TemperatureFilter;
pub use turbidity::TurbidityConditioner;
