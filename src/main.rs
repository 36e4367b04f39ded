#![no_std]
#![no_main]

mod board;
mod bluetooth;
mod peripherals;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Input, Level, Output, OutputDrive, Pull},
    interrupt::{self, InterruptExt, Priority},
    peripherals::SPI2,
    saadc::{self, ChannelConfig, Resolution, Saadc},
    spim,
};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel, signal::Signal};
use embassy_time::{Duration, Instant, Ticker, Timer};
use nrf_softdevice::{Flash, Softdevice};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use bluetooth::Server;
use fitface::{
    settings::store::RecordStore,
    system::time::{TimeManager, TimeReference},
    ui::health::NoHealth,
    Capabilities, ClockStyle, Event, WatchConfig, Watchface,
};
use peripherals::{battery::Battery, display::Display, flash::SettingsFlash};

// Others
use chrono::{NaiveDateTime, Timelike};

// Include current UTC epoch at compile time
include!(concat!(env!("OUT_DIR"), "/utc.rs"));

/// Time read from a connected phone
pub struct TimeSync {
    pub local: NaiveDateTime,
    pub uptime: core::time::Duration,
}

// Communication channels
static EVENTS: Channel<ThreadModeRawMutex, Event, 8> = Channel::new();
static TIME_SYNC: Signal<ThreadModeRawMutex, TimeSync> = Signal::new();

static SERVER: StaticCell<Server> = StaticCell::new();

fn uptime() -> core::time::Duration {
    core::time::Duration::from_millis(Instant::now().as_millis())
}

/// Fetch the battery status from the hardware.
#[embassy_executor::task(pool_size = 1)]
async fn update_battery_status(mut battery: Battery, server: &'static Server) {
    loop {
        if let Some(state) = battery.update().await {
            // Battery status changed
            defmt::info!(
                "Battery status: {} ({})",
                state.charge_percent,
                if state.is_charging {
                    "charging"
                } else {
                    "discharging"
                }
            );
            if server.bas.battery_level_set(&state.charge_percent).is_err() {
                defmt::warn!("Failed to update battery service");
            }
            EVENTS.send(Event::BatteryChanged(state)).await;
        }

        // Re-schedule the timer interrupt in 1s
        Timer::after(Duration::from_secs(1)).await;
    }
}

/// Report every new minute.
#[embassy_executor::task(pool_size = 1)]
async fn update_time(mut clock: TimeManager) {
    let mut tick = Ticker::every(Duration::from_secs(1));
    loop {
        if TIME_SYNC.signaled() {
            let sync = TIME_SYNC.wait().await;
            defmt::info!("Time set by phone");
            clock.set_local_time(sync.local, sync.uptime);
        }

        if let Some(now) = clock.minute_changed(uptime()) {
            defmt::info!("Current time: {}:{}", now.hour(), now.minute());
            EVENTS.send(Event::Tick(now)).await;
        }

        // Re-schedule the timer interrupt in 1s
        tick.next().await;
    }
}

/// Apply events to the face, redraw and persist settings.
#[embassy_executor::task(pool_size = 1)]
async fn update_lcd(
    mut display: Display,
    mut watchface: Watchface<RecordStore, NoHealth>,
    mut flash: SettingsFlash,
) {
    if display.draw(&watchface).is_err() {
        defmt::warn!("Failed to draw watch face");
    }

    loop {
        let event = EVENTS.receive().await;
        let changed = watchface.handle(event);

        if watchface.store_mut().take_dirty() {
            if let Err(e) = flash.save(watchface.store()).await {
                defmt::warn!("Failed to save settings: {}", e);
            }
        }

        if changed && display.draw(&watchface).is_err() {
            defmt::warn!("Failed to draw watch face");
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut p = embassy_nrf::init(board::config());
    defmt::info!("Initializing");

    // Keep peripheral interrupts clear of the SoftDevice priorities
    interrupt::SAADC.set_priority(Priority::P3);
    interrupt::SPIM2_SPIS2_SPI2.set_priority(Priority::P3);

    // Initialize SAADC
    let mut saadc_config = saadc::Config::default();
    // Set resolution to 12bit, necessary for correct battery status calculation
    saadc_config.resolution = Resolution::_12BIT;
    // Pin P0.31: Voltage level
    let channel_config = ChannelConfig::single_ended(&mut p.P0_31);
    let saadc = Saadc::new(p.SAADC, Irqs, saadc_config, [channel_config]);
    saadc.calibrate().await;

    // Initalize Battery
    let battery = Battery::init(saadc, Input::new(p.P0_12, Pull::None));

    // Initialize Bluetooth
    let sd = Softdevice::enable(&bluetooth::softdevice_config());
    let server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(bluetooth::softdevice_task(sd)));

    // Restore settings
    let mut flash = SettingsFlash::new(Flash::take(sd));
    let store = flash.load().await;

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;

    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);

    // Initialize LCD
    let display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
    ));

    // Backlight pins are active low, light the lowest level
    let _backlight = [
        Output::new(p.P0_14, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_22, Level::High, OutputDrive::Standard),
        Output::new(p.P0_23, Level::High, OutputDrive::Standard),
    ];

    let config = WatchConfig::new(Capabilities {
        color: true,
        health: false,
    })
    .with_clock_style(ClockStyle::TwentyFourHour)
    .with_utc_offset(board::TIMEZONE);
    let watchface = Watchface::new(config, store, NoHealth);

    let clock = TimeManager::init(
        TimeReference::from_timestamp(UTC_EPOCH, uptime()),
        config.utc_offset,
    );

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(bluetooth::ble_task(sd, server)));
    unwrap!(spawner.spawn(update_battery_status(battery, server)));
    unwrap!(spawner.spawn(update_time(clock)));
    unwrap!(spawner.spawn(update_lcd(display, watchface, flash)));
}
