pub mod status;
pub mod traits;

pub use status::LinkStatus;
pub use traits::{BleLink, Channel, LinkError};
