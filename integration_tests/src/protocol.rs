//! Blood Pressure payload definitions matching the firmware.

#![allow(dead_code)]

/// Flags bit 0: set for kPa, clear for mmHg
pub const UNITS_FLAG: u8 = 0x01;
pub const TIME_STAMP_FLAG: u8 = 0x02;
pub const PULSE_RATE_FLAG: u8 = 0x04;
pub const USER_ID_FLAG: u8 = 0x08;
pub const MEASUREMENT_STATUS_FLAG: u8 = 0x10;

/// User ids the firmware attaches per unit system
pub const USER_ID_MMHG: u8 = 1;
pub const USER_ID_KPA: u8 = 2;

/// Measurement status word sent with every final reading
pub const MEASUREMENT_STATUS: u16 = 0x000F;

/// Blood Pressure Feature characteristic value
pub const FEATURE: u16 = 0x000F;

/// Ticks of interim values before the final measurement
pub const INDICATION_PERIOD: usize = 8;

/// Year of the time stamp after a reconnect
pub const EPOCH_YEAR: u16 = 2015;

/// Unit system encoded in the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Mmhg,
    Kpa,
}

impl Unit {
    pub fn user_id(self) -> u8 {
        match self {
            Unit::Mmhg => USER_ID_MMHG,
            Unit::Kpa => USER_ID_KPA,
        }
    }

    /// Inclusive (min, max) for systolic, diastolic, MAP
    pub fn pressure_bounds(self) -> [(u16, u16); 3] {
        match self {
            Unit::Mmhg => [(78, 250), (40, 160), (53, 200)],
            Unit::Kpa => [(10, 33), (5, 21), (7, 26)],
        }
    }
}

/// Pulse rate bounds, bpm in both unit systems
pub const PULSE_RATE_BOUNDS: (u16, u16) = (60, 130);

/// Time stamp field of a final measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// A decoded measurement or cuff pressure value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub flags: u8,
    pub unit: Unit,
    pub systolic: u16,
    pub diastolic: u16,
    pub mean_arterial_pressure: u16,
    pub timestamp: Option<Timestamp>,
    pub pulse_rate: Option<u16>,
    pub user_id: Option<u8>,
    pub status: Option<u16>,
}

/// Byte cursor over a characteristic value
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> anyhow::Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            anyhow::bail!(
                "Payload too short: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.data.len()
            );
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn u8(&mut self) -> anyhow::Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> anyhow::Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }
}

/// Parse a Blood Pressure Measurement or Intermediate Cuff Pressure value.
pub fn parse_reading(data: &[u8]) -> anyhow::Result<Reading> {
    let mut cur = Cursor { data, pos: 0 };

    let flags = cur.u8()?;
    let unit = if flags & UNITS_FLAG != 0 {
        Unit::Kpa
    } else {
        Unit::Mmhg
    };
    let systolic = cur.u16()?;
    let diastolic = cur.u16()?;
    let mean_arterial_pressure = cur.u16()?;

    let timestamp = if flags & TIME_STAMP_FLAG != 0 {
        Some(Timestamp {
            year: cur.u16()?,
            month: cur.u8()?,
            day: cur.u8()?,
            hour: cur.u8()?,
            minute: cur.u8()?,
            second: cur.u8()?,
        })
    } else {
        None
    };
    let pulse_rate = if flags & PULSE_RATE_FLAG != 0 {
        Some(cur.u16()?)
    } else {
        None
    };
    let user_id = if flags & USER_ID_FLAG != 0 {
        Some(cur.u8()?)
    } else {
        None
    };
    let status = if flags & MEASUREMENT_STATUS_FLAG != 0 {
        Some(cur.u16()?)
    } else {
        None
    };

    if cur.pos != data.len() {
        anyhow::bail!(
            "{} trailing bytes after the fields flagged in {:#04x}",
            data.len() - cur.pos,
            flags
        );
    }

    Ok(Reading {
        flags,
        unit,
        systolic,
        diastolic,
        mean_arterial_pressure,
        timestamp,
        pulse_rate,
        user_id,
        status,
    })
}
