//! Blood Pressure Service definition
//!
//! Implements the Bluetooth SIG Blood Pressure profile server side.
//! - Service UUID: 0x1810
//! - Blood Pressure Measurement: 0x2A35 (indicate)
//! - Intermediate Cuff Pressure: 0x2A36 (notify)
//! - Blood Pressure Feature: 0x2A49 (read)

use trouble_host::prelude::*;

use crate::config::measurement::{FEATURE, MAX_PAYLOAD_LEN};

/// Characteristic value carrying an encoded measurement
pub type MeasurementValue = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

/// Blood Pressure Service
///
/// The measurement and cuff pressure values are only ever pushed to the
/// peer; their stored value is never read back.
#[gatt_service(uuid = service::BLOOD_PRESSURE)]
pub struct BloodPressureService {
    /// Final reading of a request cycle
    #[characteristic(uuid = characteristic::BLOOD_PRESSURE_MEASUREMENT, indicate)]
    pub measurement: MeasurementValue,

    /// Interim cuff pressure while a request cycle runs
    #[characteristic(uuid = characteristic::INTERMEDIATE_CUFF_PRESSURE, notify)]
    pub cuff_pressure: MeasurementValue,

    #[characteristic(uuid = characteristic::BLOOD_PRESSURE_FEATURE, read, value = FEATURE)]
    pub feature: u16,
}
