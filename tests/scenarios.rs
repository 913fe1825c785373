//! End-to-end request cycles through the event dispatcher

use blp_sensor::config::measurement::{UNITS_FLAG_MASK, USER_ID_KPA, USER_ID_MMHG};
use blp_sensor::config::metrics::{DIASTOLIC_MIN_MMHG, PULSE_RATE_MIN, SYSTOLIC_MIN_MMHG};
use blp_sensor::config::scheduler::INDICATION_PERIOD;
use blp_sensor::dispatcher::{AppEvent, EventDispatcher, LinkEvent};
use blp_sensor::link::{BleLink, Channel, LinkError};
use blp_sensor::scheduler::SendScheduler;
use blp_sensor::sensor::{Metric, Oscillator, Timestamp, UnitSystem};

/// Link that records sends and fails the test if a channel ever has two
/// sends outstanding
#[derive(Default)]
struct RecordingLink {
    sent: Vec<(Channel, Vec<u8>)>,
    outstanding: [bool; 2],
    disconnects: usize,
}

impl RecordingLink {
    fn slot(channel: Channel) -> usize {
        match channel {
            Channel::Notification => 0,
            Channel::Indication => 1,
        }
    }

    fn record(&mut self, channel: Channel, data: &[u8]) -> Result<(), LinkError> {
        let slot = Self::slot(channel);
        assert!(
            !self.outstanding[slot],
            "second {:?} issued before the first was confirmed",
            channel
        );
        self.outstanding[slot] = true;
        self.sent.push((channel, data.to_vec()));
        Ok(())
    }

    /// Confirmations the stack would deliver for everything outstanding
    fn confirmations(&mut self, success: bool) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        for channel in [Channel::Notification, Channel::Indication] {
            let slot = Self::slot(channel);
            if self.outstanding[slot] {
                self.outstanding[slot] = false;
                events.push(LinkEvent::Confirmed { channel, success });
            }
        }
        events
    }

    fn count(&self, channel: Channel) -> usize {
        self.sent.iter().filter(|(c, _)| *c == channel).count()
    }

    fn last(&self, channel: Channel) -> Option<&[u8]> {
        self.sent
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, data)| data.as_slice())
    }
}

impl BleLink for RecordingLink {
    fn send_notification(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.record(Channel::Notification, data)
    }

    fn send_indication(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.record(Channel::Indication, data)
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.outstanding = [false; 2];
    }
}

struct Harness {
    events: EventDispatcher,
    scheduler: SendScheduler,
    link: RecordingLink,
}

impl Harness {
    fn connected(notify: bool, indicate: bool) -> Self {
        let events = EventDispatcher::new();
        events.arm();
        let mut harness = Self {
            events,
            scheduler: SendScheduler::default(),
            link: RecordingLink::default(),
        };
        harness.link_event(LinkEvent::Connected);
        harness.link_event(LinkEvent::ChannelEnabled {
            channel: Channel::Notification,
            enabled: notify,
        });
        harness.link_event(LinkEvent::ChannelEnabled {
            channel: Channel::Indication,
            enabled: indicate,
        });
        harness
    }

    fn link_event(&mut self, event: LinkEvent) {
        assert!(self.events.post_link(event));
        self.drain();
    }

    fn post(&mut self, event: AppEvent) {
        self.events.post(event);
        self.drain();
    }

    fn drain(&mut self) {
        self.events
            .drain_and_dispatch(&mut self.scheduler, &mut self.link);
    }

    /// Deliver the stack's confirmations for everything outstanding
    fn confirm(&mut self, success: bool) {
        for event in self.link.confirmations(success) {
            self.link_event(event);
        }
    }
}

#[test]
fn notifications_only_stall_until_next_press() {
    let mut h = Harness::connected(true, false);

    h.post(AppEvent::Button);
    h.confirm(true);
    for _ in 0..40 {
        h.post(AppEvent::Tick);
        h.confirm(true);
    }

    assert_eq!(h.link.count(Channel::Notification), INDICATION_PERIOD as usize);
    assert_eq!(h.link.count(Channel::Indication), 0);
    assert!(!h.scheduler.snapshot().session.request_active);

    h.post(AppEvent::Button);
    assert_eq!(
        h.link.count(Channel::Notification),
        INDICATION_PERIOD as usize + 1
    );
}

#[test]
fn indications_only_single_measurement() {
    let mut h = Harness::connected(false, true);

    h.post(AppEvent::Button);
    for _ in 0..INDICATION_PERIOD {
        h.post(AppEvent::Tick);
    }

    assert_eq!(h.link.count(Channel::Indication), 1);
    let measurement = h.link.last(Channel::Indication).unwrap();
    // First press toggles from kPa to mmHg
    assert_eq!(measurement[0] & UNITS_FLAG_MASK, 0);
    assert_eq!(measurement[16], USER_ID_MMHG);
    assert_eq!(
        u16::from_le_bytes([measurement[1], measurement[2]]),
        SYSTOLIC_MIN_MMHG + 1
    );
    assert_eq!(
        u16::from_le_bytes([measurement[3], measurement[4]]),
        DIASTOLIC_MIN_MMHG + 1
    );
    assert_eq!(
        u16::from_le_bytes([measurement[14], measurement[15]]),
        PULSE_RATE_MIN + 1
    );

    h.confirm(true);
    let snap = h.scheduler.snapshot();
    assert!(!snap.session.request_active);
    assert_eq!(snap.session.tick_count, 0);

    for _ in 0..20 {
        h.post(AppEvent::Tick);
    }
    assert_eq!(h.link.count(Channel::Indication), 1);
}

#[test]
fn failed_indication_ends_session() {
    let mut h = Harness::connected(true, true);

    h.post(AppEvent::Button);
    h.confirm(true);
    for _ in 0..INDICATION_PERIOD {
        h.post(AppEvent::Tick);
        h.confirm(true);
    }
    let sent = h.link.sent.len();

    // Rerun the last cycle, this time the peer never acknowledges
    h.post(AppEvent::Button);
    for _ in 0..INDICATION_PERIOD {
        h.post(AppEvent::Tick);
        if h.link.outstanding[0] {
            h.link_event(LinkEvent::Confirmed {
                channel: Channel::Notification,
                success: true,
            });
            h.link.outstanding[0] = false;
        }
    }
    assert_eq!(h.link.count(Channel::Indication), 2);
    h.confirm(false);

    assert_eq!(h.link.disconnects, 1);
    let after_teardown = h.link.sent.len();
    assert!(after_teardown > sent);
    for _ in 0..20 {
        h.post(AppEvent::Tick);
        h.post(AppEvent::Button);
    }
    assert_eq!(h.link.sent.len(), after_teardown);

    // The stack reports the drop, then the peer reconnects
    h.link_event(LinkEvent::Disconnected);
    h.link_event(LinkEvent::Connected);
    h.link_event(LinkEvent::ChannelEnabled {
        channel: Channel::Notification,
        enabled: true,
    });
    h.post(AppEvent::Button);
    assert_eq!(h.link.sent.len(), after_teardown + 1);
}

#[test]
fn button_during_cycle_changes_nothing() {
    let mut h = Harness::connected(true, true);

    h.post(AppEvent::Button);
    h.confirm(true);
    h.post(AppEvent::Tick);

    let before = h.scheduler.snapshot();
    let sent = h.link.sent.len();
    h.post(AppEvent::Button);

    assert_eq!(h.scheduler.snapshot(), before);
    assert_eq!(h.link.sent.len(), sent);
}

#[test]
fn disconnect_mid_cycle_restores_defaults() {
    let mut h = Harness::connected(true, true);

    h.post(AppEvent::Button);
    for _ in 0..INDICATION_PERIOD + 2 {
        h.confirm(true);
        h.post(AppEvent::Tick);
    }
    h.link_event(LinkEvent::Disconnected);

    assert_eq!(h.scheduler.now(), Timestamp::EPOCH);
    assert_eq!(*h.scheduler.oscillator(), Oscillator::new());
    let snap = h.scheduler.snapshot();
    assert!(!snap.session.connected);
    assert!(!snap.session.request_active);
    assert!(!snap.notification.enabled);
    assert!(!snap.indication.enabled);

    for unit in UnitSystem::ALL {
        for metric in Metric::ALL {
            assert_eq!(
                h.scheduler.oscillator().value(metric, unit),
                blp_sensor::sensor::bounds(metric, unit).min
            );
        }
    }
}

#[test]
fn units_alternate_between_cycles() {
    let mut h = Harness::connected(false, true);

    let mut ids = Vec::new();
    for _ in 0..4 {
        h.post(AppEvent::Button);
        for _ in 0..INDICATION_PERIOD {
            h.post(AppEvent::Tick);
        }
        ids.push(h.link.last(Channel::Indication).unwrap()[16]);
        h.confirm(true);
    }

    assert_eq!(ids, vec![USER_ID_MMHG, USER_ID_KPA, USER_ID_MMHG, USER_ID_KPA]);
}

#[test]
fn one_outstanding_send_per_channel_under_irregular_confirmations() {
    let mut h = Harness::connected(true, true);
    // Small LCG so the confirmation pattern is irregular but repeatable
    let mut seed: u32 = 0x2545_F491;
    let mut next = move || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        seed >> 24
    };

    for _ in 0..600 {
        match next() % 4 {
            0 => h.post(AppEvent::Button),
            1 | 2 => h.post(AppEvent::Tick),
            _ => h.confirm(true),
        }
    }

    // RecordingLink asserts the invariant on every send
    assert!(h.link.count(Channel::Notification) > 0);
    assert!(h.link.count(Channel::Indication) > 0);
    assert_eq!(h.link.disconnects, 0);
}
