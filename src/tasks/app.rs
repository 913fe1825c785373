//! Scheduler run loop task

use log::info;

use crate::ble::QueuedLink;
use crate::dispatcher::EVENTS;
use crate::scheduler::SendScheduler;

/// Owns the scheduler and feeds it every dispatched event
pub async fn app_task() {
    let mut scheduler = SendScheduler::default();
    let mut link = QueuedLink::new();

    info!(
        "Blood pressure sensor ready, final measurement after {} ticks",
        scheduler.config().indication_period
    );

    EVENTS.run(&mut scheduler, &mut link).await;
}
