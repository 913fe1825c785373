//! Bluetooth Low Energy module
//!
//! Provides the Blood Pressure GATT service and the bridge that carries
//! scheduler sends to the connection task.

pub mod link;
pub mod service;

pub use link::{OutboundFrame, QueuedLink, DISCONNECT_REQUEST, LINK_STATUS, OUTBOUND};
pub use service::BloodPressureService;
