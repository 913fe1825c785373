//! Session and channel state owned by the send scheduler

use crate::config::scheduler::{ANNOUNCE_ON_INDICATION_ENABLE, INDICATION_PERIOD};
use crate::link::LinkError;
use crate::protocol::PayloadError;
use crate::sensor::UnitSystem;

/// Runtime tuning of the request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Ticks after the button press at which the final measurement is indicated
    pub indication_period: u8,
    /// Indicate the current reading when the peer enables indications
    pub announce_on_indication_enable: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            indication_period: INDICATION_PERIOD,
            announce_on_indication_enable: ANNOUNCE_ON_INDICATION_ENABLE,
        }
    }
}

/// Outcome of the last send issued on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// Nothing outstanding; the previous send (if any) was confirmed
    Acknowledged,
    /// Issued, confirmation not yet received
    InFlight,
    /// Confirmation reported failure
    Failed,
}

/// Peer configuration and send tracking for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Peer has enabled this channel through its CCCD
    pub enabled: bool,
    pub send: SendState,
}

impl ChannelState {
    /// A new send may only be issued when this is true
    pub fn last_send_acknowledged(&self) -> bool {
        self.send == SendState::Acknowledged
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            enabled: false,
            send: SendState::Acknowledged,
        }
    }
}

/// Per-connection request cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub connected: bool,
    /// A button-triggered cycle is running
    pub request_active: bool,
    /// Ticks since the cycle started
    pub tick_count: u8,
    /// Unit system of the readings being sent
    pub unit: UnitSystem,
}

/// Copy of everything the callbacks can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub session: SessionState,
    pub notification: ChannelState,
    pub indication: ChannelState,
}

/// Why a send was not issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    Link(LinkError),
    Payload(PayloadError),
}

impl From<LinkError> for SendError {
    fn from(e: LinkError) -> Self {
        SendError::Link(e)
    }
}

impl From<PayloadError> for SendError {
    fn from(e: PayloadError) -> Self {
        SendError::Payload(e)
    }
}
