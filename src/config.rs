//! Profile and hardware configuration constants for the simulated
//! Blood Pressure sensor on the ESP32-S3

/// Bounds of the simulated readings
///
/// These are the Blood Pressure profile reference values the peer's display
/// expects. Pressures come in both unit systems, pulse rate is always bpm.
pub mod metrics {
    pub const SYSTOLIC_MIN_MMHG: u16 = 78;
    pub const SYSTOLIC_MAX_MMHG: u16 = 250;
    pub const DIASTOLIC_MIN_MMHG: u16 = 40;
    pub const DIASTOLIC_MAX_MMHG: u16 = 160;
    pub const MAP_MIN_MMHG: u16 = 53;
    pub const MAP_MAX_MMHG: u16 = 200;

    pub const SYSTOLIC_MIN_KPA: u16 = 10;
    pub const SYSTOLIC_MAX_KPA: u16 = 33;
    pub const DIASTOLIC_MIN_KPA: u16 = 5;
    pub const DIASTOLIC_MAX_KPA: u16 = 21;
    pub const MAP_MIN_KPA: u16 = 7;
    pub const MAP_MAX_KPA: u16 = 26;

    pub const PULSE_RATE_MIN: u16 = 60;
    pub const PULSE_RATE_MAX: u16 = 130;
}

/// Calendar limits for the measurement time stamp
pub mod clock {
    pub const SECOND_MAX: u8 = 59;
    pub const MINUTE_MAX: u8 = 59;
    pub const HOUR_MAX: u8 = 23;
    /// Every month is treated as having this many days
    pub const DAY_MAX: u8 = 30;
    pub const MONTH_MAX: u8 = 12;
    pub const YEAR_MAX: u16 = 9999;

    /// Time stamp after reset: 2015-01-01 00:00:00
    pub const EPOCH_YEAR: u16 = 2015;
    pub const EPOCH_MONTH: u8 = 1;
    pub const EPOCH_DAY: u8 = 1;
}

/// Request cycle timing
pub mod scheduler {
    /// Ticks of interim cuff pressure before the final measurement is indicated
    pub const INDICATION_PERIOD: u8 = 8;

    /// Indicate the current reading as soon as the peer enables indications
    pub const ANNOUNCE_ON_INDICATION_ENABLE: bool = false;
}

/// Blood Pressure Measurement / Intermediate Cuff Pressure encoding
pub mod measurement {
    /// Flags bit 0: set for kPa, clear for mmHg
    pub const UNITS_FLAG_MASK: u8 = 0x01;
    pub const TIME_STAMP_FLAG_MASK: u8 = 0x02;
    pub const PULSE_RATE_FLAG_MASK: u8 = 0x04;
    pub const USER_ID_FLAG_MASK: u8 = 0x08;
    pub const MEASUREMENT_STATUS_FLAG_MASK: u8 = 0x10;

    /// User id attached to mmHg readings
    pub const USER_ID_MMHG: u8 = 1;
    /// User id attached to kPa readings
    pub const USER_ID_KPA: u8 = 2;

    /// Body movement, cuff fit, irregular pulse and pulse range all reported
    pub const MEASUREMENT_STATUS: u16 = 0x000F;

    /// Blood Pressure Feature characteristic value
    pub const FEATURE: u16 = 0x000F;

    /// Largest payload (full measurement indication)
    pub const MAX_PAYLOAD_LEN: usize = 19;
}

/// BLE peripheral configuration
pub mod ble {
    /// Advertised complete local name
    pub const DEVICE_NAME: &str = "BLP-Sensor";

    /// Number of maximum concurrent connections
    pub const CONNECTIONS_MAX: usize = 1;

    /// Number of L2CAP channels (signal + att)
    pub const L2CAP_CHANNELS_MAX: usize = 2;

    /// Random static address used while advertising
    pub const ADDRESS: [u8; 6] = [0x42, 0x50, 0x1A, 0x05, 0xE4, 0xFF];
}

/// Event queue sizing
pub mod events {
    /// Tick and button, at most one of each pending
    pub const APP_EVENT_SLOTS: usize = 2;

    /// Connection lifecycle, confirmations and CCCD changes awaiting the run loop
    pub const LINK_EVENT_QUEUE_SIZE: usize = 8;

    /// Link event slots CCCD writes may not take: connect, disconnect and
    /// one confirmation per channel
    pub const LINK_EVENT_RESERVED_SLOTS: usize = 4;

    /// Outbound notifications/indications handed to the connection task
    pub const OUTBOUND_QUEUE_SIZE: usize = 2;
}

/// Periodic timer
pub mod timer {
    /// Tick period in milliseconds (nominally 1 Hz)
    pub const TICK_INTERVAL_MS: u64 = 1000;
}

/// User button
pub mod button {
    /// GPIO0 is the BOOT button on ESP32-S3 dev boards
    pub const PIN: u8 = 0;

    /// Button debounce time (ms)
    pub const DEBOUNCE_MS: u64 = 50;
}
