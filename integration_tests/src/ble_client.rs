//! BLE client for the Blood Pressure sensor.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

/// Expand a 16-bit SIG UUID onto the Bluetooth base UUID
const fn sig_uuid(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_0000_0000_1000_8000_0080_5f9b_34fb)
}

pub const BLOOD_PRESSURE_SERVICE_UUID: Uuid = sig_uuid(0x1810);
pub const MEASUREMENT_UUID: Uuid = sig_uuid(0x2A35); // Indicate
pub const CUFF_PRESSURE_UUID: Uuid = sig_uuid(0x2A36); // Notify
pub const FEATURE_UUID: Uuid = sig_uuid(0x2A49); // Read

/// A value pushed by the device.
#[derive(Debug, Clone)]
pub struct Received {
    pub uuid: Uuid,
    pub value: Vec<u8>,
}

/// BLE client for the Blood Pressure sensor.
pub struct BleClient {
    peripheral: Peripheral,
    measurement_char: Characteristic,
    cuff_pressure_char: Characteristic,
    feature_char: Characteristic,
    /// Values received from both channels, oldest first
    received: Arc<Mutex<Vec<Received>>>,
}

impl BleClient {
    /// Scan for a device by name, connect and subscribe to both channels.
    pub async fn connect_by_name(name: &str, scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Bluetooth adapters found"))?;

        adapter
            .start_scan(ScanFilter {
                services: vec![BLOOD_PRESSURE_SERVICE_UUID],
            })
            .await?;

        let peripheral = Self::find_device_by_name(&adapter, name, scan_timeout).await?;

        adapter.stop_scan().await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        let find = |uuid: Uuid, what: &str| {
            characteristics
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or_else(|| anyhow!("{} characteristic not found", what))
        };

        let measurement_char = find(MEASUREMENT_UUID, "Blood Pressure Measurement")?;
        let cuff_pressure_char = find(CUFF_PRESSURE_UUID, "Intermediate Cuff Pressure")?;
        let feature_char = find(FEATURE_UUID, "Blood Pressure Feature")?;

        let received = Arc::new(Mutex::new(Vec::new()));

        // Start listening before subscribing so nothing is missed
        let received_clone = received.clone();
        let mut stream = peripheral.notifications().await?;
        tokio::spawn(async move {
            while let Some(data) = stream.next().await {
                if data.uuid == MEASUREMENT_UUID || data.uuid == CUFF_PRESSURE_UUID {
                    received_clone.lock().await.push(Received {
                        uuid: data.uuid,
                        value: data.value,
                    });
                }
            }
        });

        // Writes the CCCDs, which the firmware turns into channel enables
        peripheral.subscribe(&cuff_pressure_char).await?;
        peripheral.subscribe(&measurement_char).await?;

        Ok(Self {
            peripheral,
            measurement_char,
            cuff_pressure_char,
            feature_char,
            received,
        })
    }

    /// Find a device by name within the scan timeout.
    async fn find_device_by_name(
        adapter: &Adapter,
        name: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let start = std::time::Instant::now();

        while start.elapsed() < scan_timeout {
            let peripherals = adapter.peripherals().await?;

            for peripheral in peripherals {
                if let Some(props) = peripheral.properties().await? {
                    if let Some(local_name) = props.local_name {
                        if local_name == name {
                            return Ok(peripheral);
                        }
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(anyhow!("Device '{}' not found within timeout", name))
    }

    /// Read the Blood Pressure Feature word.
    pub async fn read_feature(&self) -> Result<u16> {
        let value = self.peripheral.read(&self.feature_char).await?;
        match value.as_slice() {
            [lo, hi] => Ok(u16::from_le_bytes([*lo, *hi])),
            other => Err(anyhow!("Feature value has {} bytes, expected 2", other.len())),
        }
    }

    /// Wait for the next final measurement indication.
    ///
    /// Returns every cuff pressure value received before it, and the
    /// measurement itself.
    pub async fn wait_for_measurement(
        &self,
        cycle_timeout: Duration,
    ) -> Result<(Vec<Vec<u8>>, Vec<u8>)> {
        let result = timeout(cycle_timeout, async {
            loop {
                {
                    let mut buf = self.received.lock().await;
                    if let Some(pos) = buf.iter().position(|r| r.uuid == MEASUREMENT_UUID) {
                        let cycle: Vec<Received> = buf.drain(..=pos).collect();
                        let (interim, last) = cycle.split_at(cycle.len() - 1);
                        let interim = interim.iter().map(|r| r.value.clone()).collect();
                        return (interim, last[0].value.clone());
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;

        result.map_err(|_| anyhow!("Timeout waiting for blood pressure measurement"))
    }

    /// Values received so far without consuming them.
    pub async fn received(&self) -> Vec<Received> {
        self.received.lock().await.clone()
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        self.peripheral.unsubscribe(&self.cuff_pressure_char).await?;
        self.peripheral.unsubscribe(&self.measurement_char).await?;
        self.peripheral.disconnect().await?;
        Ok(())
    }

    /// Drop any values received so far.
    pub async fn clear_buffer(&self) {
        self.received.lock().await.clear();
    }
}
