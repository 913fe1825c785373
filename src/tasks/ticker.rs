//! Periodic tick source
//!
//! Stands in for the hardware timer interrupt: posts a tick at the configured
//! interval. Ticks that arrive while one is still pending are coalesced by
//! the dispatcher.

use embassy_time::{Duration, Ticker};

use crate::config::timer::TICK_INTERVAL_MS;
use crate::dispatcher::{AppEvent, EVENTS};

/// Task that posts [`AppEvent::Tick`] forever
pub async fn ticker_task() {
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;
        if !EVENTS.post(AppEvent::Tick) {
            log::trace!("Tick coalesced, previous one not yet handled");
        }
    }
}
