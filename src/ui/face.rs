//! Watch face display state

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use embedded_text::alignment::HorizontalAlignment;

use super::{
    battery, Fonts, Label, Palette, BATTERY_ICON_BOUNDS, BATTERY_PERCENT_BOUNDS,
    BLUETOOTH_BOUNDS, DATE_BOUNDS, KCAL_BOUNDS, STEPS_BOUNDS, TIME_BOUNDS,
};
use crate::{event::BatteryChargeState, system::config::Capabilities};

/// Everything shown on the face
#[derive(Clone)]
pub struct DisplayState {
    /// Window background, visible around the labels
    pub background: Rgb565,
    pub time: Label,
    pub date: Label,
    pub battery_percent: Label,
    pub bluetooth: Label,
    /// Steps label, only with a health service
    pub steps: Option<Label>,
    /// Calories label, only with a health service
    pub kcal: Option<Label>,
    /// Battery shown by the icon
    pub battery: BatteryChargeState,
    pub palette: Palette,
}

impl DisplayState {
    /// Create the initial face with placeholder texts
    pub fn new(capabilities: &Capabilities, fonts: &Fonts) -> Self {
        let palette = Palette::new(capabilities);
        let bg = palette.background;
        let health_label = |text: &str, bounds| {
            Label::new(
                text,
                bounds,
                fonts.medium,
                HorizontalAlignment::Center,
                palette.highlight,
                bg,
            )
        };

        Self {
            background: bg,
            time: Label::new(
                "00:00",
                TIME_BOUNDS,
                fonts.large,
                HorizontalAlignment::Center,
                palette.highlight,
                bg,
            ),
            date: Label::new(
                "",
                DATE_BOUNDS,
                fonts.medium,
                HorizontalAlignment::Center,
                palette.text,
                bg,
            ),
            battery_percent: Label::new(
                "80%",
                BATTERY_PERCENT_BOUNDS,
                fonts.small,
                HorizontalAlignment::Left,
                palette.text,
                bg,
            ),
            bluetooth: Label::new(
                "Bluetooth",
                BLUETOOTH_BOUNDS,
                fonts.small,
                HorizontalAlignment::Center,
                palette.accent,
                bg,
            ),
            steps: capabilities
                .health
                .then(|| health_label("Waiting", STEPS_BOUNDS)),
            kcal: capabilities
                .health
                .then(|| health_label("Waiting", KCAL_BOUNDS)),
            battery: BatteryChargeState::new(80, false),
            palette,
        }
    }

    /// All labels currently on the face
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        [&self.time, &self.date, &self.battery_percent, &self.bluetooth]
            .into_iter()
            .chain(self.steps.iter())
            .chain(self.kcal.iter())
    }

    pub fn labels_mut(&mut self) -> impl Iterator<Item = &mut Label> {
        [
            &mut self.time,
            &mut self.date,
            &mut self.battery_percent,
            &mut self.bluetooth,
        ]
        .into_iter()
        .chain(self.steps.iter_mut())
        .chain(self.kcal.iter_mut())
    }

    /// Set the window background only. Returns whether it changed.
    pub fn set_window_background(&mut self, color: Rgb565) -> bool {
        core::mem::replace(&mut self.background, color) != color
    }

    /// Set the window and every label background in one go.
    ///
    /// Returns whether anything changed.
    pub fn set_background(&mut self, color: Rgb565) -> bool {
        let mut changed = self.set_window_background(color);
        for label in self.labels_mut() {
            changed |= label.set_background(color);
        }
        changed
    }

    /// Draw the whole face onto `target`
    pub fn render<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(self.background)?;
        for label in self.labels() {
            label.draw(target)?;
        }
        battery::draw_icon(
            target,
            BATTERY_ICON_BOUNDS.top_left,
            &self.battery,
            &self.palette,
        )
    }
}
