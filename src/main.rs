#![no_std]
#![no_main]

extern crate alloc;

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use blp_sensor::dispatcher::EVENTS;
use blp_sensor::tasks;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

/// Type alias for the BLE controller
type BleController = trouble_host::prelude::ExternalController<
    esp_radio::ble::controller::BleConnector<'static>,
    10,
>;

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();

    // Initialise heap allocator for BLE support (64KB - BLE requires significant heap)
    esp_alloc::heap_allocator!(size: 64 * 1024);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // BOOT button, active low
    let button = Input::new(peripherals.GPIO0, InputConfig::default().with_pull(Pull::Up));

    // Initialise esp-radio for BLE support (must be after esp_rtos::start)
    let radio_controller = RADIO_CONTROLLER.init(
        esp_radio::init().expect("Failed to initialize esp-radio")
    );

    // Create BLE connector (ownership is passed to ExternalController)
    let ble_connector = esp_radio::ble::controller::BleConnector::new(
        radio_controller,
        peripherals.BT,
        esp_radio::ble::Config::default(),
    ).expect("Failed to initialize BLE connector");

    // Wrap in ExternalController for trouble-host compatibility
    let controller: BleController = trouble_host::prelude::ExternalController::new(ble_connector);

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, button, controller));
    })
}

#[embassy_executor::task]
async fn async_main(spawner: Spawner, button: Input<'static>, ble_controller: BleController) {
    spawner.must_spawn(app_task());
    spawner.must_spawn(ble_host_task(ble_controller));
    spawner.must_spawn(ticker_task());
    spawner.must_spawn(button_task(button));

    // Everything that consumes events is running
    EVENTS.arm();
    log::info!("Press the button to receive the blood pressure parameters");
}

/// Task that owns the scheduler and drains the event queues
#[embassy_executor::task]
async fn app_task() {
    tasks::app_task().await;
}

/// Task that manages BLE connectivity
///
/// This task handles advertising, connections, and carries notifications and
/// indications for the Blood Pressure Service.
#[embassy_executor::task]
async fn ble_host_task(controller: BleController) {
    tasks::ble_task(controller).await;
}

/// Task standing in for the periodic hardware timer
#[embassy_executor::task]
async fn ticker_task() {
    tasks::ticker_task().await;
}

/// Task that debounces the user button
#[embassy_executor::task]
async fn button_task(button: Input<'static>) {
    tasks::button_task(button).await;
}
