//! Event loop driver
//!
//! [`Watchface`] owns the display state and reacts to one [`Event`] at a
//! time. Each handler runs to completion and reports whether the face needs
//! to be redrawn.

use chrono::{NaiveDateTime, Timelike};
use embedded_graphics::{pixelcolor::Rgb565, prelude::DrawTarget};

use crate::{
    event::{BatteryChargeState, Event, HealthEvent},
    settings::{
        self, message::Dictionary, store::KeyValueStore, BackgroundColor, BackgroundUpdate,
        DisplaySettings, KEY_HIGH_CONTRAST,
    },
    system::config::WatchConfig,
    ui::{
        battery,
        clock::ClockReading,
        connectivity::ConnectivityLabel,
        health::{HealthService, HealthSnapshot, NoHealth},
        rgb, DisplayState, Fonts, HIGH_CONTRAST_BACKGROUND, TWO_TONE_BACKGROUND,
    },
};

/// The watch face and everything it needs to react to events
pub struct Watchface<S, H = NoHealth> {
    config: WatchConfig,
    display: DisplayState,
    store: S,
    health: H,
    /// Time of the last tick, `None` until the clock has ticked once
    now: Option<NaiveDateTime>,
}

impl<S, H> Watchface<S, H>
where
    S: KeyValueStore,
    H: HealthService,
{
    /// Create the face and restore the persisted settings from `store`.
    pub fn new(config: WatchConfig, store: S, health: H) -> Self {
        let mut display = DisplayState::new(&config.capabilities, &Fonts::default());

        let settings = DisplaySettings::load(&store);
        info!(
            "Restoring settings: high contrast {}, custom color {}",
            settings.high_contrast,
            settings.background.is_some()
        );
        if let Some(color) = settings.background {
            if config.capabilities.color {
                display.set_background(to_display_color(color));
            }
        }
        // High contrast wins over an older color
        if settings.high_contrast {
            display.set_window_background(HIGH_CONTRAST_BACKGROUND);
        }

        Self {
            config,
            display,
            store,
            health,
            now: None,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Settings as currently persisted
    pub fn settings(&self) -> DisplaySettings {
        DisplaySettings::load(&self.store)
    }

    /// Handle one event. Returns whether the face changed.
    pub fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Tick(now) => self.update_time(now),
            Event::BatteryChanged(state) => self.update_battery(state),
            Event::ConnectivityChanged(connected) => self.update_connectivity(connected),
            Event::HealthChanged(event) => self.update_health(event),
            Event::MessageReceived(message) => self.apply_message(&message),
        }
    }

    /// Draw the face onto `target`
    pub fn render<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.display.render(target)
    }

    fn update_time(&mut self, now: NaiveDateTime) -> bool {
        self.now = Some(now);
        let reading = ClockReading::new(now, self.config.clock_style);
        trace!("Tick {}:{}", now.hour(), now.minute());

        let time_changed = self.display.time.set_text(&reading.time);
        let date_changed = self.display.date.set_text(&reading.date);
        time_changed || date_changed
    }

    fn update_battery(&mut self, state: BatteryChargeState) -> bool {
        debug!(
            "Battery status: {}% ({})",
            state.charge_percent,
            if state.is_charging {
                "charging"
            } else {
                "discharging"
            }
        );
        let icon_changed = core::mem::replace(&mut self.display.battery, state) != state;
        let text = battery::label_text(&state);
        let label_changed = self.display.battery_percent.set_text(&text);
        icon_changed || label_changed
    }

    fn update_connectivity(&mut self, connected: bool) -> bool {
        info!("Connection {}", if connected { "up" } else { "down" });
        let status = ConnectivityLabel::new(connected, &self.display.palette);
        let text_changed = self.display.bluetooth.set_text(status.text);
        let color_changed = self.display.bluetooth.set_color(status.color);
        text_changed || color_changed
    }

    fn update_health(&mut self, event: HealthEvent) -> bool {
        if !self.config.capabilities.health || !event.refreshes_summary() {
            return false;
        }
        // Without a tick the day being summed is unknown
        if self.now.is_none() {
            return false;
        }
        let snapshot = HealthSnapshot::query(&self.health, self.health.now());
        debug!(
            "Health: {} steps ({}), {} kcal ({})",
            snapshot.steps_today,
            snapshot.steps_available,
            snapshot.kcal_today,
            snapshot.kcal_available
        );

        let mut changed = false;
        // Labels without fresh data keep their last value
        if let (Some(text), Some(label)) = (snapshot.steps_text(), self.display.steps.as_mut()) {
            changed |= label.set_text(&text);
        }
        if let (Some(text), Some(label)) = (snapshot.kcal_text(), self.display.kcal.as_mut()) {
            changed |= label.set_text(&text);
        }
        changed
    }

    fn apply_message(&mut self, message: &Dictionary) -> bool {
        let update = settings::decode(message, &self.config.capabilities);
        info!("Settings received: high contrast {}", update.high_contrast);

        let was_high_contrast = self.store.read_bool(KEY_HIGH_CONTRAST) == Some(true);

        let mut changed = false;
        if update.high_contrast {
            changed |= self.display.set_window_background(HIGH_CONTRAST_BACKGROUND);
        } else if was_high_contrast {
            // Back to the stored theme, as shown after a restart
            let window = self.stored_window_background(&DisplaySettings::load(&self.store));
            changed |= self.display.set_window_background(window);
        }
        if let Err(_err) = self.store.write_bool(KEY_HIGH_CONTRAST, update.high_contrast) {
            warn!("Failed to persist high contrast flag: {}", _err);
        }

        match update.background {
            BackgroundUpdate::Unchanged => {}
            BackgroundUpdate::TwoTone => {
                changed |= self.display.set_window_background(TWO_TONE_BACKGROUND);
            }
            BackgroundUpdate::Color(color) => {
                info!(
                    "Background color {} {} {}",
                    color.red, color.green, color.blue
                );
                if let Err(_err) = color.persist(&mut self.store) {
                    warn!("Failed to persist background color: {}", _err);
                }
                changed |= self.display.set_background(to_display_color(color));
            }
        }
        changed
    }
}

impl<S, H> Watchface<S, H> {
    /// Window background for `settings` with high contrast off
    fn stored_window_background(&self, settings: &DisplaySettings) -> Rgb565 {
        match settings.background {
            Some(color) if self.config.capabilities.color => to_display_color(color),
            _ => self.display.palette.background,
        }
    }
}

fn to_display_color(color: BackgroundColor) -> Rgb565 {
    rgb(color.red, color.green, color.blue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        settings::{
            message::{settings_message, Value},
            store::RecordStore,
            KEY_COLOR_BLUE_BG, KEY_COLOR_GREEN_BG, KEY_COLOR_RED_BG,
        },
        system::config::{Capabilities, ClockStyle},
        ui::health::tests::FakeHealth,
    };
    use chrono::NaiveDate;
    use embedded_graphics::pixelcolor::RgbColor;

    fn face(capabilities: Capabilities) -> Watchface<RecordStore, FakeHealth> {
        Watchface::new(
            WatchConfig::new(capabilities),
            RecordStore::new(),
            FakeHealth::default(),
        )
    }

    fn message(tuples: &[(u32, i32)]) -> Event {
        let mut dict = Dictionary::new();
        for &(key, value) in tuples {
            dict.insert(key, Value::Int(value)).unwrap();
        }
        Event::MessageReceived(dict)
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn tick_updates_clock_labels() {
        let mut face = Watchface::new(
            WatchConfig::default().with_clock_style(ClockStyle::TwelveHour),
            RecordStore::new(),
            NoHealth,
        );
        assert!(face.handle(Event::Tick(at(13, 7))));
        assert_eq!(face.display().time.text(), " 1:07");
        assert_eq!(face.display().date.text(), "Sun 03 Mar");
        assert!(!face.handle(Event::Tick(at(13, 7))));
    }

    #[test]
    fn charging_replaces_percentage() {
        let mut face = face(Capabilities::FULL);
        assert!(face.handle(Event::BatteryChanged(BatteryChargeState::new(5, true))));
        assert_eq!(face.display().battery_percent.text(), "Charging");
        assert_eq!(face.display().battery.charge_percent, 5);

        assert!(face.handle(Event::BatteryChanged(BatteryChargeState::new(5, false))));
        assert_eq!(face.display().battery_percent.text(), "5%");
    }

    #[test]
    fn battery_icon_change_alone_redraws() {
        let mut face = face(Capabilities::FULL);
        face.handle(Event::BatteryChanged(BatteryChargeState::new(40, true)));
        assert!(face.handle(Event::BatteryChanged(BatteryChargeState::new(41, true))));
        assert!(!face.handle(Event::BatteryChanged(BatteryChargeState::new(41, true))));
    }

    #[test]
    fn connectivity_is_idempotent() {
        let mut face = face(Capabilities::FULL);
        let palette = face.display().palette;

        assert!(face.handle(Event::ConnectivityChanged(false)));
        assert_eq!(face.display().bluetooth.text(), "No connection");
        assert_eq!(face.display().bluetooth.color, palette.warning);
        assert!(!face.handle(Event::ConnectivityChanged(false)));

        assert!(face.handle(Event::ConnectivityChanged(true)));
        assert_eq!(face.display().bluetooth.text(), "Bluetooth");
        assert_eq!(face.display().bluetooth.color, palette.accent);
        assert!(!face.handle(Event::ConnectivityChanged(true)));
    }

    #[test]
    fn health_keeps_last_known_value() {
        let mut face = face(Capabilities::FULL);
        face.health.steps = Some(120);
        face.health.resting = Some(1000);
        face.handle(Event::Tick(at(12, 0)));
        face.health.clock = Some(at(12, 0));
        assert!(face.handle(Event::HealthChanged(HealthEvent::SignificantUpdate)));
        assert_eq!(face.display().steps.as_ref().unwrap().text(), "120 Steps");
        assert_eq!(face.display().kcal.as_ref().unwrap().text(), "1000 KCal");

        face.health.steps = None;
        face.health.active = 50;
        assert!(face.handle(Event::HealthChanged(HealthEvent::MovementUpdate)));
        assert_eq!(face.display().steps.as_ref().unwrap().text(), "120 Steps");
        assert_eq!(face.display().kcal.as_ref().unwrap().text(), "1050 KCal");
    }

    #[test]
    fn health_waits_for_first_tick() {
        let mut face = face(Capabilities::FULL);
        face.health.steps = Some(120);
        face.health.clock = Some(at(9, 0));
        assert!(!face.handle(Event::HealthChanged(HealthEvent::SignificantUpdate)));
        assert_eq!(face.health.window.get(), None);
        assert_eq!(face.display().steps.as_ref().unwrap().text(), "Waiting");
    }

    #[test]
    fn health_sums_up_to_current_time() {
        let mut face = face(Capabilities::FULL);
        face.health.steps = Some(120);
        face.handle(Event::Tick(at(9, 0)));
        let current = at(9, 0) + chrono::TimeDelta::try_seconds(45).unwrap();
        face.health.clock = Some(current);

        assert!(face.handle(Event::HealthChanged(HealthEvent::MovementUpdate)));
        assert_eq!(face.health.window.get(), Some((at(0, 0), current)));
    }

    #[test]
    fn sleep_updates_do_not_recompute() {
        let mut face = face(Capabilities::FULL);
        face.health.steps = Some(99);
        assert!(!face.handle(Event::HealthChanged(HealthEvent::SleepUpdate)));
        assert_eq!(face.display().steps.as_ref().unwrap().text(), "Waiting");
    }

    #[test]
    fn health_needs_capability() {
        let mut face = Watchface::new(
            WatchConfig::new(Capabilities {
                color: true,
                health: false,
            }),
            RecordStore::new(),
            FakeHealth {
                steps: Some(5),
                ..Default::default()
            },
        );
        assert!(!face.handle(Event::HealthChanged(HealthEvent::SignificantUpdate)));
        assert!(face.display().steps.is_none());
    }

    #[test]
    fn high_contrast_flag_leaves_color() {
        let mut face = face(Capabilities::FULL);
        face.handle(message(&[(0, 10), (1, 20), (2, 30)]));
        face.store_mut().take_dirty();

        assert!(face.handle(message(&[(3, 1)])));
        assert_eq!(face.display().background, HIGH_CONTRAST_BACKGROUND);
        let settings = face.settings();
        assert!(settings.high_contrast);
        assert_eq!(settings.background, Some(BackgroundColor::new(10, 20, 30)));
        assert!(face.store_mut().take_dirty());
    }

    #[test]
    fn clearing_high_contrast_restores_stored_color() {
        let mut face = face(Capabilities::FULL);
        face.handle(message(&[(0, 10), (1, 20), (2, 30)]));
        face.handle(message(&[(3, 1)]));
        assert_eq!(face.display().background, HIGH_CONTRAST_BACKGROUND);

        assert!(face.handle(message(&[(3, 0)])));
        assert_eq!(face.display().background, rgb(10, 20, 30));
        // Already off, nothing to restore
        assert!(!face.handle(message(&[(3, 0)])));
    }

    #[test]
    fn clearing_high_contrast_without_color() {
        let mut face = face(Capabilities::FULL);
        face.handle(message(&[(3, 1)]));
        face.handle(message(&[(3, 0)]));
        assert_eq!(face.display().background, face.display().palette.background);
    }

    #[test]
    fn missing_flag_persists_false() {
        let mut face = face(Capabilities::FULL);
        face.handle(message(&[(3, 1)]));
        face.handle(message(&[(0, 1)]));
        assert_eq!(face.store().read_bool(KEY_HIGH_CONTRAST), Some(false));
    }

    #[test]
    fn partial_color_changes_nothing() {
        let mut face = face(Capabilities::FULL);
        assert!(!face.handle(message(&[(0, 10), (1, 20)])));
        assert!(!face.store().contains(KEY_COLOR_RED_BG));
        assert!(!face.store().contains(KEY_COLOR_GREEN_BG));
        assert_eq!(face.display().background, Rgb565::BLACK);
    }

    #[test]
    fn full_color_is_persisted_and_applied() {
        let mut face = face(Capabilities::FULL);
        assert!(face.handle(message(&[(0, 10), (1, 20), (2, 30)])));

        assert_eq!(face.store().read_int(KEY_COLOR_RED_BG), Some(10));
        assert_eq!(face.store().read_int(KEY_COLOR_GREEN_BG), Some(20));
        assert_eq!(face.store().read_int(KEY_COLOR_BLUE_BG), Some(30));
        let expected = rgb(10, 20, 30);
        assert_eq!(face.display().background, expected);
        assert!(face.display().labels().all(|l| l.background == expected));
    }

    #[test]
    fn monochrome_forces_two_tone() {
        let mut face = face(Capabilities::MONOCHROME);
        assert!(face.handle(message(&[(0, 10), (1, 20), (2, 30)])));
        assert_eq!(face.display().background, TWO_TONE_BACKGROUND);
        assert!(!face.store().contains(KEY_COLOR_RED_BG));
        assert!(face.display().labels().all(|l| l.background == Rgb565::BLACK));
    }

    #[test]
    fn companion_message_round_trip() {
        let mut face = face(Capabilities::FULL);
        let mut buf = [0u8; 64];
        let len = settings_message(false, "0x0055AA").encode(&mut buf).unwrap();
        assert!(face.handle(Event::MessageReceived(Dictionary::parse(&buf[..len]))));
        assert_eq!(face.display().background, rgb(0x00, 0x55, 0xAA));
    }

    #[test]
    fn restores_persisted_settings() {
        let mut store = RecordStore::new();
        BackgroundColor::new(10, 20, 30).persist(&mut store).unwrap();
        let face = Watchface::new(WatchConfig::default(), store, NoHealth);
        assert_eq!(face.display().background, rgb(10, 20, 30));
        assert_eq!(face.display().time.background, rgb(10, 20, 30));

        store.write_bool(KEY_HIGH_CONTRAST, true).unwrap();
        let face = Watchface::new(WatchConfig::default(), store, NoHealth);
        assert_eq!(face.display().background, HIGH_CONTRAST_BACKGROUND);
        assert_eq!(face.display().time.background, rgb(10, 20, 30));

        let face = Watchface::new(WatchConfig::new(Capabilities::MONOCHROME), store, NoHealth);
        assert_eq!(face.display().background, Rgb565::BLACK);
        assert_eq!(face.display().time.background, Rgb565::BLACK);
    }
}
