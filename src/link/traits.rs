//! BLE link trait for abstraction and testability
//!
//! This trait is the only way the scheduler reaches the BLE stack. Sends are
//! fire-and-forget: the outcome arrives later as a confirmation event, so
//! nothing here blocks or awaits.

/// Delivery path on the blood pressure characteristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Intermediate cuff pressure, notified
    Notification,
    /// Final blood pressure measurement, indicated
    Indication,
}

/// Errors a send can fail with synchronously
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No peer connected
    NotConnected,
    /// Peer has not enabled this channel
    NotEnabled,
    /// Stack cannot accept another send right now
    Busy,
    /// Stack refused the payload
    Rejected,
}

/// Abstract BLE stack interface for testability
///
/// The firmware implements this on top of a queue serviced by the
/// connection task; tests use [`mock::MockLink`].
pub trait BleLink {
    /// Queue an intermediate cuff pressure notification
    ///
    /// `Ok` means the send was issued and a confirmation will follow.
    fn send_notification(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Queue a blood pressure measurement indication
    ///
    /// `Ok` means the send was issued and a confirmation will follow.
    fn send_indication(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Tear down the current connection
    fn disconnect(&mut self);
}

#[cfg(test)]
pub mod mock {
    //! Mock BLE link for testing

    use super::*;
    use crate::config::measurement::MAX_PAYLOAD_LEN;
    use core::cell::RefCell;
    use heapless::Vec;

    /// A send recorded by the mock
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentFrame {
        pub channel: Channel,
        pub data: Vec<u8, MAX_PAYLOAD_LEN>,
    }

    /// Mock BLE link for unit testing
    pub struct MockLink {
        /// Record of issued sends, oldest first
        sent: RefCell<Vec<SentFrame, 64>>,
        /// Number of disconnect requests
        disconnects: RefCell<usize>,
        /// Error to return on next notification
        next_notification_error: RefCell<Option<LinkError>>,
        /// Error to return on next indication
        next_indication_error: RefCell<Option<LinkError>>,
    }

    impl MockLink {
        /// Create a new mock link
        pub fn new() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                disconnects: RefCell::new(0),
                next_notification_error: RefCell::new(None),
                next_indication_error: RefCell::new(None),
            }
        }

        /// Set an error to be returned by the next send_notification() call
        pub fn set_next_notification_error(&self, error: LinkError) {
            *self.next_notification_error.borrow_mut() = Some(error);
        }

        /// Set an error to be returned by the next send_indication() call
        pub fn set_next_indication_error(&self, error: LinkError) {
            *self.next_indication_error.borrow_mut() = Some(error);
        }

        /// Get all issued sends
        pub fn get_sent(&self) -> Vec<SentFrame, 64> {
            self.sent.borrow().clone()
        }

        /// Issued sends on one channel
        pub fn sent_on(&self, channel: Channel) -> usize {
            self.sent
                .borrow()
                .iter()
                .filter(|frame| frame.channel == channel)
                .count()
        }

        /// Most recent send on one channel
        pub fn last_on(&self, channel: Channel) -> Option<SentFrame> {
            self.sent
                .borrow()
                .iter()
                .rev()
                .find(|frame| frame.channel == channel)
                .cloned()
        }

        /// Number of disconnect() calls
        pub fn disconnect_count(&self) -> usize {
            *self.disconnects.borrow()
        }

        fn record(&self, channel: Channel, data: &[u8]) -> Result<(), LinkError> {
            let mut frame = SentFrame {
                channel,
                data: Vec::new(),
            };
            frame
                .data
                .extend_from_slice(data)
                .map_err(|_| LinkError::Rejected)?;
            self.sent
                .borrow_mut()
                .push(frame)
                .map_err(|_| LinkError::Busy)
        }
    }

    impl Default for MockLink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl BleLink for MockLink {
        fn send_notification(&mut self, data: &[u8]) -> Result<(), LinkError> {
            if let Some(error) = self.next_notification_error.borrow_mut().take() {
                return Err(error);
            }
            self.record(Channel::Notification, data)
        }

        fn send_indication(&mut self, data: &[u8]) -> Result<(), LinkError> {
            if let Some(error) = self.next_indication_error.borrow_mut().take() {
                return Err(error);
            }
            self.record(Channel::Indication, data)
        }

        fn disconnect(&mut self) {
            *self.disconnects.borrow_mut() += 1;
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_records_sends() {
            let mut link = MockLink::new();

            link.send_notification(&[0x08, 0x50, 0x00]).unwrap();
            link.send_indication(&[0x1E]).unwrap();

            let sent = link.get_sent();
            assert_eq!(sent.len(), 2);
            assert_eq!(sent[0].channel, Channel::Notification);
            assert_eq!(sent[0].data.as_slice(), &[0x08, 0x50, 0x00]);
            assert_eq!(link.sent_on(Channel::Indication), 1);
        }

        #[test]
        fn test_mock_send_error() {
            let mut link = MockLink::new();

            link.set_next_indication_error(LinkError::Busy);
            assert_eq!(link.send_indication(&[0x01]), Err(LinkError::Busy));

            // Error should be cleared, next call should succeed
            link.send_indication(&[0x02]).unwrap();
            assert_eq!(link.sent_on(Channel::Indication), 1);
        }

        #[test]
        fn test_mock_disconnect_count() {
            let mut link = MockLink::new();
            link.disconnect();
            link.disconnect();
            assert_eq!(link.disconnect_count(), 2);
        }
    }
}
