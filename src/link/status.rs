//! Connection and CCCD state as last reported by the BLE stack
//!
//! Written by the connection task, read by the link when a send is issued.
//! The scheduler keeps its own copy through [`LinkEvent`]s; this one lets
//! the link refuse sends the stack could not deliver before those events
//! have been drained.
//!
//! [`LinkEvent`]: crate::dispatcher::LinkEvent

use core::sync::atomic::{AtomicBool, Ordering};

use super::{Channel, LinkError};

/// Lock-free view of the current peer
pub struct LinkStatus {
    connected: AtomicBool,
    notify_enabled: AtomicBool,
    indicate_enabled: AtomicBool,
}

impl LinkStatus {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            notify_enabled: AtomicBool::new(false),
            indicate_enabled: AtomicBool::new(false),
        }
    }

    /// A peer connected with both channels disabled
    pub fn set_connected(&self) {
        self.notify_enabled.store(false, Ordering::Release);
        self.indicate_enabled.store(false, Ordering::Release);
        self.connected.store(true, Ordering::Release);
    }

    pub fn set_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
        self.notify_enabled.store(false, Ordering::Release);
        self.indicate_enabled.store(false, Ordering::Release);
    }

    pub fn set_enabled(&self, channel: Channel, enabled: bool) {
        self.flag(channel).store(enabled, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.flag(channel).load(Ordering::Acquire)
    }

    /// Check that a send on `channel` can reach the peer
    pub fn check(&self, channel: Channel) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        if !self.is_enabled(channel) {
            return Err(LinkError::NotEnabled);
        }
        Ok(())
    }

    fn flag(&self, channel: Channel) -> &AtomicBool {
        match channel {
            Channel::Notification => &self.notify_enabled,
            Channel::Indication => &self.indicate_enabled,
        }
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::new()
    }
}
