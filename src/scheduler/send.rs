//! Send scheduler
//!
//! Drives one request cycle per button press: interim cuff pressure is
//! notified once per second until `indication_period` ticks have elapsed,
//! then the final measurement is indicated. At most one send per channel is
//! outstanding; a new one is only issued after the previous was confirmed.
//!
//! Every method here runs in the single-threaded drain of the event
//! dispatcher, so state transitions never race the BLE or timer callbacks.

use log::{debug, info, warn};

use crate::link::{BleLink, Channel};
use crate::protocol::Measurement;
use crate::sensor::{ClockTracker, Metric, Oscillator, Timestamp, UnitSystem};

use super::state::{
    ChannelState, SchedulerConfig, SchedulerSnapshot, SendError, SendState, SessionState,
};

/// Application-level state machine for the blood pressure characteristics
pub struct SendScheduler {
    config: SchedulerConfig,
    session: SessionState,
    notification: ChannelState,
    indication: ChannelState,
    oscillator: Oscillator,
    clock: ClockTracker,
    /// Second in which the last interim notification was attempted
    last_notified: Option<Timestamp>,
    /// The indication in flight is the enable-time announcement, not a measurement
    announcing: bool,
}

impl SendScheduler {
    /// Create a disconnected scheduler
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            session: SessionState::default(),
            notification: ChannelState::default(),
            indication: ChannelState::default(),
            oscillator: Oscillator::new(),
            clock: ClockTracker::new(),
            last_notified: None,
            announcing: false,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Current session and channel state
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            session: self.session,
            notification: self.notification,
            indication: self.indication,
        }
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Peer connected: start a fresh session
    pub fn on_connect(&mut self) {
        self.reset();
        self.session.connected = true;
        info!("Peer connected");
    }

    /// Peer gone: drop all session, channel and simulation state
    pub fn on_disconnect(&mut self) {
        if self.session.connected {
            info!("Peer disconnected");
        }
        self.reset();
    }

    /// The peer wrote the CCCD of one of the characteristics
    pub fn on_channel_enable_changed<L: BleLink>(
        &mut self,
        channel: Channel,
        enabled: bool,
        link: &mut L,
    ) {
        if !self.session.connected {
            debug!("Ignoring {:?} enable change while disconnected", channel);
            return;
        }

        match channel {
            Channel::Notification => {
                self.notification.enabled = enabled;
                if enabled {
                    info!("Notifications enabled by the remote device for interim cuff pressure");
                } else {
                    info!("Notifications disabled by the remote device for interim cuff pressure");
                    // Skip the remaining interim values, the measurement is still due
                    if self.session.tick_count < self.config.indication_period {
                        self.session.tick_count = self.config.indication_period;
                    }
                }
            }
            Channel::Indication => {
                self.indication.enabled = enabled;
                if enabled {
                    info!("Indications enabled by the remote device for blood pressure");
                    if self.config.announce_on_indication_enable {
                        self.announce(link);
                    }
                } else {
                    info!("Indications disabled by the remote device for blood pressure");
                }
            }
        }
    }

    /// The stack reported the outcome of the outstanding send on `channel`
    pub fn on_confirmation<L: BleLink>(&mut self, channel: Channel, success: bool, link: &mut L) {
        if !self.session.connected {
            debug!("Ignoring {:?} confirmation after disconnect", channel);
            return;
        }

        let state = match channel {
            Channel::Notification => &mut self.notification,
            Channel::Indication => &mut self.indication,
        };
        if state.send != SendState::InFlight {
            warn!("Unexpected {:?} confirmation with nothing outstanding", channel);
            return;
        }

        match (channel, success) {
            (Channel::Notification, true) => {
                debug!("Notification successfully sent over the air");
                state.send = SendState::Acknowledged;
            }
            (Channel::Notification, false) => {
                warn!("Sending notification over the air failed");
                state.send = SendState::Failed;
            }
            (Channel::Indication, true) if self.announcing => {
                debug!("Current reading announced");
                state.send = SendState::Acknowledged;
                self.announcing = false;
            }
            (Channel::Indication, true) => {
                debug!("Indication successfully sent over the air");
                state.send = SendState::Acknowledged;
                self.session.request_active = false;
                self.session.tick_count = 0;
                info!("Press the button to receive the blood pressure parameters");
            }
            (Channel::Indication, false) => {
                state.send = SendState::Failed;
                warn!("Sending indication over the air failed, disconnecting");
                self.teardown(link);
            }
        }
    }

    /// User pressed the button: start a request cycle if none is running
    pub fn on_button<L: BleLink>(&mut self, link: &mut L) {
        if !self.session.connected {
            debug!("Button ignored, no peer connected");
            return;
        }
        if self.session.request_active {
            debug!("Button ignored, request already in progress");
            return;
        }
        if !self.indication.enabled && !self.notification.enabled {
            info!("Button ignored, peer has not enabled notifications or indications");
            return;
        }

        if self.indication.enabled {
            self.session.unit = self.session.unit.toggled();
        }
        self.session.request_active = true;
        self.session.tick_count = 0;

        // A failed notification never gets a confirmation; a new cycle may retry
        if self.notification.send == SendState::Failed {
            self.notification.send = SendState::Acknowledged;
        }

        if self.notification.enabled {
            info!("Started sending interim cuff pressure values");
        }

        self.step(link);
    }

    /// Periodic timer fired
    pub fn on_tick<L: BleLink>(&mut self, link: &mut L) {
        if !self.session.connected {
            return;
        }

        self.clock.tick();

        if self.session.request_active {
            self.step(link);
        }
    }

    /// One pass of the request cycle
    fn step<L: BleLink>(&mut self, link: &mut L) {
        let period = self.config.indication_period;
        let tick = self.session.tick_count;

        if tick < period && self.notification.enabled && self.is_new_second() {
            self.last_notified = Some(self.clock.now());
            if self.notification.last_send_acknowledged() {
                if let Err(e) = self.send_interim(link) {
                    debug!("Interim cuff pressure not sent: {:?}", e);
                }
            } else {
                debug!("Previous notification unconfirmed, skipping this second");
            }
        }

        if tick == period {
            if !self.indication.enabled {
                // Nothing will ever confirm this cycle; go idle until the next press
                info!("Indications disabled, request ends without a measurement");
                self.session.request_active = false;
                self.session.tick_count = 0;
                return;
            }

            if !self.indication.last_send_acknowledged() {
                warn!("Previous indication is unconfirmed, disconnecting");
                self.teardown(link);
                return;
            }

            match self.send_measurement(link) {
                // Past the threshold so it is not indicated twice
                Ok(()) => self.session.tick_count = period.saturating_add(1),
                // Nothing reached the peer; stay at the threshold and retry next tick
                Err(e) => warn!("Measurement indication not issued: {:?}", e),
            }
            return;
        }

        self.session.tick_count = tick.saturating_add(1);
    }

    fn is_new_second(&self) -> bool {
        self.last_notified != Some(self.clock.now())
    }

    fn send_interim<L: BleLink>(&mut self, link: &mut L) -> Result<(), SendError> {
        let unit = self.session.unit;
        let mut next = self.oscillator.clone();
        let cuff = next.advance(Metric::InterimSystolic, unit);

        let payload = Measurement::interim(unit, cuff).encode()?;
        link.send_notification(&payload)?;

        info!("Cuff pressure {} {}", cuff, unit.label());
        self.oscillator = next;
        self.notification.send = SendState::InFlight;
        Ok(())
    }

    fn send_measurement<L: BleLink>(&mut self, link: &mut L) -> Result<(), SendError> {
        let unit = self.session.unit;
        let mut next = self.oscillator.clone();
        let systolic = next.advance(Metric::Systolic, unit);
        let diastolic = next.advance(Metric::Diastolic, unit);
        let map = next.advance(Metric::MeanArterialPressure, unit);
        let pulse = next.advance(Metric::PulseRate, unit);

        let payload =
            Measurement::complete(unit, systolic, diastolic, map, self.clock.now(), pulse)
                .encode()?;
        link.send_indication(&payload)?;

        log_reading(unit, systolic, diastolic, map, pulse);
        self.oscillator = next;
        self.indication.send = SendState::InFlight;
        Ok(())
    }

    /// Indicate the current reading without advancing it
    fn announce<L: BleLink>(&mut self, link: &mut L) {
        if !self.indication.last_send_acknowledged() {
            debug!("Indication outstanding, not announcing current reading");
            return;
        }

        let unit = self.session.unit;
        let osc = &self.oscillator;
        let reading = Measurement::snapshot(
            unit,
            osc.value(Metric::Systolic, unit),
            osc.value(Metric::Diastolic, unit),
            osc.value(Metric::MeanArterialPressure, unit),
            osc.value(Metric::PulseRate, unit),
        );

        let sent = reading
            .encode()
            .map_err(SendError::from)
            .and_then(|payload| link.send_indication(&payload).map_err(SendError::from));

        match sent {
            Ok(()) => {
                log_reading(
                    unit,
                    reading.systolic,
                    reading.diastolic,
                    reading.mean_arterial_pressure,
                    reading.pulse_rate.unwrap_or_default(),
                );
                self.indication.send = SendState::InFlight;
                self.announcing = true;
            }
            Err(e) => debug!("Current reading not announced: {:?}", e),
        }
    }

    /// Drop the link after a fatal indication failure
    fn teardown<L: BleLink>(&mut self, link: &mut L) {
        link.disconnect();
        self.reset();
    }

    fn reset(&mut self) {
        self.session = SessionState::default();
        self.notification = ChannelState::default();
        self.indication = ChannelState::default();
        self.oscillator.reset();
        self.clock.reset();
        self.last_notified = None;
        self.announcing = false;
    }
}

impl Default for SendScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

fn log_reading(unit: UnitSystem, systolic: u16, diastolic: u16, map: u16, pulse: u16) {
    let label = unit.label();
    info!("The blood pressure values are:");
    info!("Systolic    {} {}", systolic, label);
    info!("Diastolic   {} {}", diastolic, label);
    info!("Map         {} {}", map, label);
    info!("Pulse rate  {} bpm", pulse);
}
