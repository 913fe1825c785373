//! Embassy tasks module
//!
//! Contains all async tasks for the firmware, organised by functionality.

pub mod app;
pub mod ble;
pub mod button;
pub mod ticker;

pub use app::app_task;
pub use ble::ble_task;
pub use button::button_task;
pub use ticker::ticker_task;
