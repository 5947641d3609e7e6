//! Control-decision engines.
//!
//! Two strategies per controlled variable, selectable at runtime:
//! fuzzy inference ([`fuzzy`]) and PID ([`pid`] for the heater loop,
//! [`turbidity`] for the gain-scheduled pump loop). Strategy selection
//! lives in [`mode`].

pub mod fuzzy;
pub mod mode;
pub mod pid;
pub mod turbidity;
