//! BLE task for the Blood Pressure peripheral
//!
//! Implements the BLE host task that advertises, accepts one connection at a
//! time and bridges it to the scheduler: stack callbacks become
//! [`LinkEvent`]s, and frames queued by [`QueuedLink`](crate::ble::QueuedLink)
//! are notified or indicated here.

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, info, warn};
use trouble_host::prelude::*;

use crate::ble::{
    BloodPressureService, OutboundFrame, DISCONNECT_REQUEST, LINK_STATUS, OUTBOUND,
};
use crate::config::ble::{ADDRESS, CONNECTIONS_MAX, DEVICE_NAME, L2CAP_CHANNELS_MAX};
use crate::dispatcher::{LinkEvent, EVENTS};
use crate::link::Channel;

/// CCCD bit enabling notifications
const CCCD_NOTIFY: u8 = 0x01;
/// CCCD bit enabling indications
const CCCD_INDICATE: u8 = 0x02;

/// BLE GATT Server with the Blood Pressure Service
#[gatt_server(mutex_type = CriticalSectionRawMutex)]
struct Server {
    bps: BloodPressureService,
}

/// Main BLE task that manages the Bluetooth stack and connections
///
/// This task:
/// 1. Starts advertising as [`DEVICE_NAME`] with the Blood Pressure service UUID
/// 2. Accepts a connection and reports it to the scheduler
/// 3. Turns CCCD writes into channel enable changes
/// 4. Sends queued notifications/indications and reports their outcome
/// 5. Resumes advertising once the peer is gone
pub async fn ble_task<C: Controller>(controller: C) {
    info!("BLE: Starting as '{}'", DEVICE_NAME);

    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();

    let stack = trouble_host::new(controller, &mut resources)
        .set_random_address(Address::random(ADDRESS));

    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: DEVICE_NAME,
        appearance: &appearance::blood_pressure::GENERIC_BLOOD_PRESSURE,
    });
    let server: Server = match Server::new_with_config(gap) {
        Ok(s) => s,
        Err(e) => {
            warn!("BLE: Failed to build GATT server: {:?}", e);
            return;
        }
    };

    let runner_task = runner.run();

    let peripheral_task = async {
        let service_uuids = [service::BLOOD_PRESSURE.to_le_bytes()];
        let mut adv_data = [0u8; 31];
        let len = match AdStructure::encode_slice(
            &[
                AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                AdStructure::ServiceUuids16(&service_uuids),
                AdStructure::CompleteLocalName(DEVICE_NAME.as_bytes()),
            ],
            &mut adv_data,
        ) {
            Ok(l) => l,
            Err(e) => {
                warn!("BLE: Advertising data does not fit: {:?}", e);
                return;
            }
        };

        loop {
            debug!("BLE: Advertising...");
            let advertiser = match peripheral
                .advertise(
                    &Default::default(),
                    Advertisement::ConnectableScannableUndirected {
                        adv_data: &adv_data[..len],
                        scan_data: &[],
                    },
                )
                .await
            {
                Ok(a) => a,
                Err(_) => continue,
            };

            let acceptor = match advertiser.accept().await {
                Ok(a) => a,
                Err(_) => continue,
            };

            let conn = match acceptor.with_attribute_server(&*server) {
                Ok(c) => c,
                Err(_) => continue,
            };

            // Nothing queued or requested for a previous peer applies to this one
            OUTBOUND.clear();
            DISCONNECT_REQUEST.reset();
            LINK_STATUS.set_connected();
            EVENTS.post_link(LinkEvent::Connected);

            serve_connection(&server, &conn).await;

            LINK_STATUS.set_disconnected();
            OUTBOUND.clear();
            EVENTS.post_link(LinkEvent::Disconnected);
        }
    };

    embassy_futures::select::select(runner_task, peripheral_task).await;
}

/// Handle one connection until the peer goes away
async fn serve_connection<P: PacketPool>(server: &Server<'_>, conn: &GattConnection<'_, '_, P>) {
    loop {
        match select3(conn.next(), OUTBOUND.receive(), DISCONNECT_REQUEST.wait()).await {
            Either3::First(GattConnectionEvent::Disconnected { reason }) => {
                info!("BLE: Disconnected: {:?}", reason);
                return;
            }
            Either3::First(GattConnectionEvent::Gatt { event }) => match event {
                GattEvent::Write(write_event) => {
                    if let Some((channel, enabled)) =
                        cccd_change(server, write_event.handle(), write_event.data())
                    {
                        LINK_STATUS.set_enabled(channel, enabled);
                        EVENTS.post_link(LinkEvent::ChannelEnabled { channel, enabled });
                    }
                    let _ = write_event.accept();
                }
                GattEvent::Read(read_event) => {
                    let _ = read_event.accept();
                }
                GattEvent::Other(other_event) => {
                    let _ = other_event.accept();
                }
            },
            Either3::First(_) => {}
            Either3::Second(frame) => {
                let channel = frame.channel;
                let success = send_frame(server, conn, &frame).await;
                EVENTS.post_link(LinkEvent::Confirmed { channel, success });
            }
            Either3::Third(()) => {
                warn!("BLE: Dropping connection on request");
                conn.raw().disconnect();
            }
        }
    }
}

/// Push one queued frame to the peer
async fn send_frame<P: PacketPool>(
    server: &Server<'_>,
    conn: &GattConnection<'_, '_, P>,
    frame: &OutboundFrame,
) -> bool {
    let result = match frame.channel {
        Channel::Notification => server.bps.cuff_pressure.notify(conn, &frame.payload).await,
        Channel::Indication => server.bps.measurement.indicate(conn, &frame.payload).await,
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("BLE: {:?} send failed: {:?}", frame.channel, e);
            false
        }
    }
}

/// Map a write to one of our CCCDs onto the channel it configures
fn cccd_change(server: &Server<'_>, handle: u16, data: &[u8]) -> Option<(Channel, bool)> {
    let bits = data.first().copied().unwrap_or(0);

    if Some(handle) == server.bps.cuff_pressure.cccd_handle {
        Some((Channel::Notification, bits & CCCD_NOTIFY != 0))
    } else if Some(handle) == server.bps.measurement.cccd_handle {
        Some((Channel::Indication, bits & CCCD_INDICATE != 0))
    } else {
        None
    }
}
