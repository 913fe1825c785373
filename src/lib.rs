#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dispatcher;
pub mod link;
pub mod protocol;
pub mod scheduler;
pub mod sensor;

// These modules depend on the radio, HAL and embassy runtime only available with embedded feature
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod tasks;
