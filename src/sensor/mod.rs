//! Synthetic sensor state: the time stamp and the oscillating readings

pub mod clock;
pub mod oscillator;

pub use clock::{ClockTracker, Timestamp};
pub use oscillator::{bounds, Bounds, Metric, Oscillator, UnitSystem};
