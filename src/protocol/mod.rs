pub mod measurement;

pub use measurement::{user_id_for, Measurement, Payload, PayloadError};
