//! [`BleLink`] implementation backed by queues to the connection task
//!
//! The scheduler runs in its own task and cannot await a GATT send, so sends
//! are handed to the connection task through [`OUTBOUND`]. The connection task
//! performs the notify/indicate and posts the outcome back as a
//! [`LinkEvent::Confirmed`](crate::dispatcher::LinkEvent::Confirmed).

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel as Queue, TrySendError};
use embassy_sync::signal::Signal;

use crate::config::events::OUTBOUND_QUEUE_SIZE;
use crate::link::{BleLink, Channel, LinkError, LinkStatus};
use crate::protocol::Payload;

/// A send waiting for the connection task
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub channel: Channel,
    pub payload: Payload,
}

/// Sends from the scheduler to the connection task
///
/// One slot per channel is enough: the scheduler never has more than one
/// send outstanding on a channel.
pub static OUTBOUND: Queue<CriticalSectionRawMutex, OutboundFrame, OUTBOUND_QUEUE_SIZE> =
    Queue::new();

/// Peer state maintained by the connection task
pub static LINK_STATUS: LinkStatus = LinkStatus::new();

/// Raised by the scheduler to drop the current connection
pub static DISCONNECT_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Link handed to the scheduler in the firmware
pub struct QueuedLink;

impl QueuedLink {
    pub fn new() -> Self {
        Self
    }

    fn enqueue(&self, channel: Channel, data: &[u8]) -> Result<(), LinkError> {
        LINK_STATUS.check(channel)?;
        let payload = Payload::from_slice(data).map_err(|_| LinkError::Rejected)?;
        OUTBOUND
            .try_send(OutboundFrame { channel, payload })
            .map_err(|TrySendError::Full(_)| LinkError::Busy)
    }
}

impl Default for QueuedLink {
    fn default() -> Self {
        Self::new()
    }
}

impl BleLink for QueuedLink {
    fn send_notification(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.enqueue(Channel::Notification, data)
    }

    fn send_indication(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.enqueue(Channel::Indication, data)
    }

    fn disconnect(&mut self) {
        DISCONNECT_REQUEST.signal(());
    }
}
