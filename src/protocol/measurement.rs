//! Blood Pressure Measurement payload encoding
//!
//! Both the Blood Pressure Measurement (indicated) and the Intermediate
//! Cuff Pressure (notified) characteristics share one layout:
//!
//! ```text
//! [flags: u8][systolic: u16 LE][diastolic: u16 LE][MAP: u16 LE]
//! [time stamp: 7 bytes]?  [pulse rate: u16 LE]?  [user id: u8]?
//! [measurement status: u16 LE]?
//! ```
//!
//! Optional fields are present when their flag bit is set:
//!
//! | Bit | Mask | Meaning                              |
//! |-----|------|--------------------------------------|
//! | 0   | 0x01 | Units: 0 = mmHg, 1 = kPa             |
//! | 1   | 0x02 | Time stamp present                   |
//! | 2   | 0x04 | Pulse rate present                   |
//! | 3   | 0x08 | User id present                      |
//! | 4   | 0x10 | Measurement status present           |
//!
//! Pressure values are sent as plain little-endian integers, matching the
//! peer profile this sensor talks to.

use crate::config::measurement::*;
use crate::sensor::{Timestamp, UnitSystem};
use heapless::Vec;

/// Encoded characteristic value
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Errors that can occur while encoding a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Encoded fields do not fit in the payload buffer
    BufferFull,
}

/// User id the profile associates with a unit system
pub fn user_id_for(unit: UnitSystem) -> u8 {
    match unit {
        UnitSystem::MillimetresOfMercury => USER_ID_MMHG,
        UnitSystem::Kilopascal => USER_ID_KPA,
    }
}

/// One reading, in either characteristic's format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub unit: UnitSystem,
    pub systolic: u16,
    pub diastolic: u16,
    pub mean_arterial_pressure: u16,
    pub timestamp: Option<Timestamp>,
    pub pulse_rate: Option<u16>,
    pub user_id: Option<u8>,
    pub status: Option<u16>,
}

impl Measurement {
    /// Intermediate cuff pressure: current cuff value, diastolic and MAP
    /// reserved as zero, user id attached
    pub fn interim(unit: UnitSystem, cuff_pressure: u16) -> Self {
        Self {
            unit,
            systolic: cuff_pressure,
            diastolic: 0,
            mean_arterial_pressure: 0,
            timestamp: None,
            pulse_rate: None,
            user_id: Some(user_id_for(unit)),
            status: None,
        }
    }

    /// Final reading closing a request cycle, every optional field present
    pub fn complete(
        unit: UnitSystem,
        systolic: u16,
        diastolic: u16,
        mean_arterial_pressure: u16,
        timestamp: Timestamp,
        pulse_rate: u16,
    ) -> Self {
        Self {
            unit,
            systolic,
            diastolic,
            mean_arterial_pressure,
            timestamp: Some(timestamp),
            pulse_rate: Some(pulse_rate),
            user_id: Some(user_id_for(unit)),
            status: Some(MEASUREMENT_STATUS),
        }
    }

    /// Current reading sent when the peer turns indications on
    pub fn snapshot(
        unit: UnitSystem,
        systolic: u16,
        diastolic: u16,
        mean_arterial_pressure: u16,
        pulse_rate: u16,
    ) -> Self {
        Self {
            unit,
            systolic,
            diastolic,
            mean_arterial_pressure,
            timestamp: None,
            pulse_rate: Some(pulse_rate),
            user_id: None,
            status: None,
        }
    }

    /// Flags byte describing the unit and which optional fields follow
    pub fn flags(&self) -> u8 {
        let mut flags = match self.unit {
            UnitSystem::MillimetresOfMercury => 0,
            UnitSystem::Kilopascal => UNITS_FLAG_MASK,
        };
        if self.timestamp.is_some() {
            flags |= TIME_STAMP_FLAG_MASK;
        }
        if self.pulse_rate.is_some() {
            flags |= PULSE_RATE_FLAG_MASK;
        }
        if self.user_id.is_some() {
            flags |= USER_ID_FLAG_MASK;
        }
        if self.status.is_some() {
            flags |= MEASUREMENT_STATUS_FLAG_MASK;
        }
        flags
    }

    /// Encode into the characteristic value
    pub fn encode(&self) -> Result<Payload, PayloadError> {
        let mut payload = Payload::new();

        push(&mut payload, &[self.flags()])?;
        push(&mut payload, &self.systolic.to_le_bytes())?;
        push(&mut payload, &self.diastolic.to_le_bytes())?;
        push(&mut payload, &self.mean_arterial_pressure.to_le_bytes())?;

        if let Some(timestamp) = self.timestamp {
            push(&mut payload, &timestamp.to_bytes())?;
        }
        if let Some(pulse_rate) = self.pulse_rate {
            push(&mut payload, &pulse_rate.to_le_bytes())?;
        }
        if let Some(user_id) = self.user_id {
            push(&mut payload, &[user_id])?;
        }
        if let Some(status) = self.status {
            push(&mut payload, &status.to_le_bytes())?;
        }

        Ok(payload)
    }
}

fn push(payload: &mut Payload, bytes: &[u8]) -> Result<(), PayloadError> {
    payload
        .extend_from_slice(bytes)
        .map_err(|_| PayloadError::BufferFull)
}
