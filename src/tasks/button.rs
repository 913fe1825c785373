//! User button task
//!
//! Watches an active-low push button and posts a press once the level has
//! been stable for the debounce time.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;
use log::debug;

use crate::config::button::DEBOUNCE_MS;
use crate::dispatcher::{AppEvent, EVENTS};

/// Task that posts [`AppEvent::Button`] on every debounced press
pub async fn button_task<B: Wait + InputPin>(mut button: B) {
    loop {
        if button.wait_for_falling_edge().await.is_err() {
            Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
            continue;
        }

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;

        // Bounce or glitch shorter than the debounce window
        if !button.is_low().unwrap_or(false) {
            continue;
        }

        if EVENTS.post(AppEvent::Button) {
            debug!("Button pressed");
        } else {
            debug!("Button press ignored");
        }

        // Released before the next press counts
        let _ = button.wait_for_high().await;
    }
}
