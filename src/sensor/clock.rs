//! Measurement time stamp
//!
//! The time stamp is a payload field only. It advances by one second per
//! dispatched tick and cascades through a fixed carry table, so every
//! month has `DAY_MAX` days and the year wraps back to the epoch.

use crate::config::clock::{
    DAY_MAX, EPOCH_DAY, EPOCH_MONTH, EPOCH_YEAR, HOUR_MAX, MINUTE_MAX, MONTH_MAX, SECOND_MAX,
    YEAR_MAX,
};

/// Calendar date and time carried in the measurement indication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    /// 2015-01-01 00:00:00
    pub const EPOCH: Self = Self {
        year: EPOCH_YEAR,
        month: EPOCH_MONTH,
        day: EPOCH_DAY,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Encode as the 7-byte Date Time field: year (u16 LE), month, day,
    /// hours, minutes, seconds
    pub fn to_bytes(&self) -> [u8; 7] {
        let year = self.year.to_le_bytes();
        [
            year[0],
            year[1],
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ]
    }

    fn get(&self, field: Field) -> u16 {
        match field {
            Field::Second => self.second as u16,
            Field::Minute => self.minute as u16,
            Field::Hour => self.hour as u16,
            Field::Day => self.day as u16,
            Field::Month => self.month as u16,
            Field::Year => self.year,
        }
    }

    fn set(&mut self, field: Field, value: u16) {
        match field {
            Field::Second => self.second = value as u8,
            Field::Minute => self.minute = value as u8,
            Field::Hour => self.hour = value as u8,
            Field::Day => self.day = value as u8,
            Field::Month => self.month = value as u8,
            Field::Year => self.year = value,
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::EPOCH
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

/// One link of the carry chain: a field, the value it restarts from and
/// the last value it may hold before carrying into the next entry.
struct Carry {
    field: Field,
    floor: u16,
    max: u16,
}

/// Least significant field first.
const CARRY_CHAIN: [Carry; 6] = [
    Carry { field: Field::Second, floor: 0, max: SECOND_MAX as u16 },
    Carry { field: Field::Minute, floor: 0, max: MINUTE_MAX as u16 },
    Carry { field: Field::Hour, floor: 0, max: HOUR_MAX as u16 },
    Carry { field: Field::Day, floor: 1, max: DAY_MAX as u16 },
    Carry { field: Field::Month, floor: 1, max: MONTH_MAX as u16 },
    Carry { field: Field::Year, floor: EPOCH_YEAR, max: YEAR_MAX },
];

/// Owns the running time stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockTracker {
    now: Timestamp,
}

impl ClockTracker {
    pub const fn new() -> Self {
        Self {
            now: Timestamp::EPOCH,
        }
    }

    /// Current time stamp
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Advance by one second, cascading overflow upward.
    pub fn tick(&mut self) -> Timestamp {
        for carry in CARRY_CHAIN.iter() {
            let value = self.now.get(carry.field);
            if value < carry.max {
                self.now.set(carry.field, value + 1);
                break;
            }
            // Overflow: restart this field and carry into the next one.
            // Past the last entry the year has wrapped to the epoch.
            self.now.set(carry.field, carry.floor);
        }
        self.now
    }

    /// Back to the epoch
    pub fn reset(&mut self) {
        self.now = Timestamp::EPOCH;
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, now: Timestamp) {
        self.now = now;
    }
}
