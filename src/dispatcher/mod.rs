//! Event dispatch between the interrupt-driven sources and the scheduler

pub mod events;

pub use events::{AppEvent, EventDispatcher, LinkEvent, EVENTS};
