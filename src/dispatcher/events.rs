//! Event queues between the stimulus tasks and the scheduler run loop
//!
//! Timer and button sources share a two-slot pending queue: each kind of
//! event occupies at most one slot, and posting one that is already pending
//! is coalesced. The BLE connection task posts its callbacks (connect,
//! disconnect, confirmations, CCCD writes) on a separate bounded channel.
//! A single run loop drains both and drives the [`SendScheduler`]; nothing
//! else touches scheduler state.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel as Queue;
use embassy_sync::signal::Signal;
use heapless::Deque;

use crate::config::events::{APP_EVENT_SLOTS, LINK_EVENT_QUEUE_SIZE, LINK_EVENT_RESERVED_SLOTS};
use crate::link::{BleLink, Channel};
use crate::scheduler::SendScheduler;

/// Stimulus from the timer or the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    Button,
}

/// Callback from the BLE stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
    /// Outcome of the outstanding send on `channel`
    Confirmed { channel: Channel, success: bool },
    /// Peer wrote the CCCD for `channel`
    ChannelEnabled { channel: Channel, enabled: bool },
}

/// Pending-event queues plus the run loop wake-up
pub struct EventDispatcher {
    pending: Mutex<CriticalSectionRawMutex, RefCell<Deque<AppEvent, APP_EVENT_SLOTS>>>,
    link_events: Queue<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_QUEUE_SIZE>,
    wake: Signal<CriticalSectionRawMutex, ()>,
    /// Button presses are dropped until the application is up
    armed: AtomicBool,
}

/// Dispatcher shared by every task in the firmware
pub static EVENTS: EventDispatcher = EventDispatcher::new();

impl EventDispatcher {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(Deque::new())),
            link_events: Queue::new(),
            wake: Signal::new(),
            armed: AtomicBool::new(false),
        }
    }

    /// Start accepting button presses
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Queue a timer or button event
    ///
    /// Never blocks. Returns `false` when the event was coalesced with one
    /// already pending or dropped because the dispatcher is not armed.
    pub fn post(&self, event: AppEvent) -> bool {
        if event == AppEvent::Button && !self.is_armed() {
            return false;
        }

        let queued = self.pending.lock(|pending| {
            let mut pending = pending.borrow_mut();
            if pending.iter().any(|e| *e == event) {
                return false;
            }
            pending.push_back(event).is_ok()
        });

        if queued {
            self.wake.signal(());
        }
        queued
    }

    /// Queue a BLE stack callback
    ///
    /// Never blocks. Returns `false` if the event was dropped.
    ///
    /// Only the connection task posts here. Between two drains it can produce
    /// one `Connected`, one `Disconnected` and one `Confirmed` per channel,
    /// since a channel's next send waits for its confirmation to be drained;
    /// those always fit in the reserved slots. CCCD writes are peer-driven and
    /// unbounded, so they are dropped once only the reserve is left.
    pub fn post_link(&self, event: LinkEvent) -> bool {
        if matches!(event, LinkEvent::ChannelEnabled { .. })
            && self.link_events.free_capacity() <= LINK_EVENT_RESERVED_SLOTS
        {
            log::warn!("Link event queue nearly full, dropping {:?}", event);
            return false;
        }

        match self.link_events.try_send(event) {
            Ok(()) => {
                self.wake.signal(());
                true
            }
            Err(_) => {
                log::warn!("Link event queue full, dropping {:?}", event);
                false
            }
        }
    }

    /// Number of timer/button events waiting
    pub fn pending(&self) -> usize {
        self.pending.lock(|pending| pending.borrow().len())
    }

    /// Hand every queued event to the scheduler
    ///
    /// Link events are applied first so the scheduler sees the connection
    /// and channel state the stack reported before the stimuli that follow.
    /// Timer and button events are handled in arrival order. Returns the
    /// number of events dispatched.
    pub fn drain_and_dispatch<L: BleLink>(
        &self,
        scheduler: &mut SendScheduler,
        link: &mut L,
    ) -> usize {
        let mut handled = 0;

        while let Ok(event) = self.link_events.try_receive() {
            match event {
                LinkEvent::Connected => scheduler.on_connect(),
                LinkEvent::Disconnected => scheduler.on_disconnect(),
                LinkEvent::Confirmed { channel, success } => {
                    scheduler.on_confirmation(channel, success, link)
                }
                LinkEvent::ChannelEnabled { channel, enabled } => {
                    scheduler.on_channel_enable_changed(channel, enabled, link)
                }
            }
            handled += 1;
        }

        let batch = self
            .pending
            .lock(|pending| core::mem::replace(&mut *pending.borrow_mut(), Deque::new()));

        for event in batch.iter() {
            match event {
                AppEvent::Tick => scheduler.on_tick(link),
                AppEvent::Button => scheduler.on_button(link),
            }
            handled += 1;
        }

        handled
    }

    /// Wait until something has been posted since the last wake-up
    pub async fn wait(&self) {
        self.wake.wait().await;
    }

    /// Wait for events and dispatch them once
    pub async fn next_batch<L: BleLink>(
        &self,
        scheduler: &mut SendScheduler,
        link: &mut L,
    ) -> usize {
        self.wait().await;
        self.drain_and_dispatch(scheduler, link)
    }

    /// Scheduler run loop, never returns
    pub async fn run<L: BleLink>(&self, scheduler: &mut SendScheduler, link: &mut L) {
        loop {
            self.next_batch(scheduler, link).await;
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
