//! Bluetooth module

use core::mem;

use embassy_time::{Duration, Timer};

use nrf_softdevice::{
    ble::{
        advertisement_builder::{
            Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
            ServiceUuid16,
        },
        gatt_server, peripheral,
    },
    raw, Config, Softdevice,
};

use fitface::{settings::message::Dictionary, Event};

use crate::{uptime, TimeSync, EVENTS, TIME_SYNC};

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(ServiceList::Complete, &[ServiceUuid16::BATTERY])
    .full_name("FitFace")
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_16(ServiceList::Complete, &[ServiceUuid16::BATTERY])
    .build();

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub bas: BatteryService,
    pub cts: CurrentTimeService,
    pub settings: SettingsService,
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    #[characteristic(uuid = "2a2b", write)]
    pub current_time: [u8; 10],
}

/// Face settings, written as an encoded dictionary
#[nrf_softdevice::gatt_service(uuid = "f17f0001-6e8c-4d2a-9c35-0a5e3f6d2b10")]
pub struct SettingsService {
    #[characteristic(uuid = "f17f0002-6e8c-4d2a-9c35-0a5e3f6d2b10", write)]
    pub message: heapless::Vec<u8, 128>,
}

pub fn softdevice_config() -> Config {
    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        // S113 is peripheral only
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: b"FitFace" as *const u8 as _,
            current_len: 7,
            max_len: 7,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise, then serve one connection at a time.
#[embassy_executor::task]
pub async fn ble_task(sd: &'static Softdevice, server: &'static Server) {
    let config = peripheral::Config::default();

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                defmt::warn!("Advertising failed: {:?}", e);
                // Retry in 1s
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };

        defmt::info!("Phone connected");
        EVENTS.send(Event::ConnectivityChanged(true)).await;

        let reason = gatt_server::run(&conn, server, |e| match e {
            ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
                defmt::debug!("Battery notifications: {}", notifications);
            }
            ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(buf)) => {
                match fitface::system::time::cts_datetime(&buf) {
                    Some(local) => TIME_SYNC.signal(TimeSync {
                        local,
                        uptime: uptime(),
                    }),
                    None => defmt::warn!("Invalid current time"),
                }
            }
            ServerEvent::Settings(SettingsServiceEvent::MessageWrite(bytes)) => {
                let message = Dictionary::parse(&bytes);
                if EVENTS.try_send(Event::MessageReceived(message)).is_err() {
                    defmt::warn!("Event queue full, settings message dropped");
                }
            }
        })
        .await;
        defmt::info!("Phone disconnected: {:?}", reason);

        EVENTS.send(Event::ConnectivityChanged(false)).await;
    }
}
