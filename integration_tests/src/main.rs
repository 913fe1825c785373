//! Integration tests for the blood pressure sensor firmware.
//!
//! Run after flashing the firmware. Connects over BLE, checks the service,
//! and validates measurement cycles triggered by pressing the device button.

mod ble_client;
mod protocol;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use ble_client::BleClient;
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the blood pressure sensor firmware")]
struct Args {
    /// Advertised name of the device
    #[arg(short, long, default_value = "BLP-Sensor")]
    name: String,

    /// BLE scan timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,

    /// Seconds to wait for a button press and the resulting measurement
    #[arg(long, default_value = "60")]
    cycle_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("{}", "Blood Pressure Sensor Integration Tests".bold());
    println!("Device: \"{}\"", args.name);
    println!();

    println!("Scanning for BLE device \"{}\"...", args.name);
    let device = BleClient::connect_by_name(&args.name, Duration::from_secs(args.scan_timeout))
        .await?;
    println!("{}", "Connected and subscribed!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&device, Duration::from_secs(args.cycle_timeout)).await;
    print_results(&results);

    let _ = device.disconnect().await;

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
