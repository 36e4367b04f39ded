//! Battery indicator

use core::fmt::Write;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use heapless::String;

use super::{label::LABEL_LEN, Palette};
use crate::event::BatteryChargeState;

/// Battery body, relative to the icon origin
const BODY: Rectangle = Rectangle::new(Point::new(0, 0), Size::new(22, 13));
/// Battery tip, relative to the icon origin
const TIP: Rectangle = Rectangle::new(Point::new(22, 2), Size::new(2, 9));
/// Top left corner of the charge bar
const FILL_ORIGIN: Point = Point::new(2, 2);
const FILL_HEIGHT: u32 = 9;
/// Width of the charge bar at 100%
pub const FILL_MAX_WIDTH: u32 = 16;

/// Charge level category, selects the color of the charge bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorBucket {
    /// Below 20%
    Low,
    /// 20% to 30%
    Medium,
    /// 31% and above
    Normal,
}

impl ColorBucket {
    pub fn from_percent(charge_percent: u8) -> Self {
        match charge_percent {
            0..=19 => ColorBucket::Low,
            20..=30 => ColorBucket::Medium,
            _ => ColorBucket::Normal,
        }
    }

    pub fn color(&self, palette: &Palette) -> Rgb565 {
        match self {
            ColorBucket::Low => palette.warning,
            ColorBucket::Medium => palette.caution,
            ColorBucket::Normal => palette.good,
        }
    }
}

/// Width of the charge bar in pixels
pub fn fill_width(charge_percent: u8) -> u32 {
    FILL_MAX_WIDTH * charge_percent.min(100) as u32 / 100
}

/// Text of the battery label. While charging the percentage is hidden.
pub fn label_text(state: &BatteryChargeState) -> String<LABEL_LEN> {
    let mut text = String::new();
    if state.is_charging {
        // Fits in LABEL_LEN
        let _ = text.push_str("Charging");
    } else {
        let _ = write!(text, "{}%", state.charge_percent);
    }
    text
}

/// Draw the battery icon with its top left corner at `origin`
pub fn draw_icon<D>(
    target: &mut D,
    origin: Point,
    state: &BatteryChargeState,
    palette: &Palette,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let outline = PrimitiveStyle::with_stroke(palette.text, 1);
    BODY.translate(origin).into_styled(outline).draw(target)?;
    TIP.translate(origin).into_styled(outline).draw(target)?;

    let width = fill_width(state.charge_percent);
    if width > 0 {
        let fill = ColorBucket::from_percent(state.charge_percent).color(palette);
        Rectangle::new(FILL_ORIGIN + origin, Size::new(width, FILL_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(fill))
            .draw(target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::config::Capabilities;
    use crate::ui::testing::Frame;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(ColorBucket::from_percent(0), ColorBucket::Low);
        assert_eq!(ColorBucket::from_percent(19), ColorBucket::Low);
        assert_eq!(ColorBucket::from_percent(20), ColorBucket::Medium);
        assert_eq!(ColorBucket::from_percent(30), ColorBucket::Medium);
        assert_eq!(ColorBucket::from_percent(31), ColorBucket::Normal);
        assert_eq!(ColorBucket::from_percent(100), ColorBucket::Normal);
    }

    #[test]
    fn bucket_covers_whole_range() {
        for percent in 0..=100u8 {
            let expected = if percent < 20 {
                ColorBucket::Low
            } else if percent < 31 {
                ColorBucket::Medium
            } else {
                ColorBucket::Normal
            };
            assert_eq!(ColorBucket::from_percent(percent), expected, "{}%", percent);
        }
    }

    #[test]
    fn fill_is_proportional() {
        assert_eq!(fill_width(0), 0);
        assert_eq!(fill_width(10), 1);
        assert_eq!(fill_width(50), 8);
        assert_eq!(fill_width(99), 15);
        assert_eq!(fill_width(100), 16);
        for percent in 0..=100u8 {
            assert!(fill_width(percent) <= FILL_MAX_WIDTH);
        }
    }

    #[test]
    fn charging_hides_percentage() {
        assert_eq!(label_text(&BatteryChargeState::new(5, true)).as_str(), "Charging");
        assert_eq!(label_text(&BatteryChargeState::new(5, false)).as_str(), "5%");
        assert_eq!(label_text(&BatteryChargeState::new(100, false)).as_str(), "100%");
    }

    #[test]
    fn icon_at_half_charge() {
        let palette = Palette::new(&Capabilities::FULL);
        let mut frame = Frame::new(Size::new(26, 13));
        draw_icon(&mut frame, Point::zero(), &BatteryChargeState::new(50, false), &palette)
            .unwrap();

        // Outline and tip
        assert_eq!(frame.pixel(Point::new(0, 0)), Some(palette.text));
        assert_eq!(frame.pixel(Point::new(21, 12)), Some(palette.text));
        assert_eq!(frame.pixel(Point::new(23, 5)), Some(palette.text));
        // Eight pixels of green bar
        assert_eq!(frame.pixel(Point::new(2, 5)), Some(palette.good));
        assert_eq!(frame.pixel(Point::new(9, 10)), Some(palette.good));
        assert_eq!(frame.pixel(Point::new(10, 5)), None);
        assert_eq!(frame.count(palette.good), 8 * 9);
    }

    #[test]
    fn empty_battery_draws_outline_only() {
        let palette = Palette::new(&Capabilities::FULL);
        let mut frame = Frame::new(Size::new(26, 13));
        draw_icon(&mut frame, Point::zero(), &BatteryChargeState::new(0, false), &palette)
            .unwrap();

        assert_eq!(frame.pixel(Point::new(0, 6)), Some(palette.text));
        assert_eq!(frame.pixel(Point::new(2, 2)), None);
        assert_eq!(frame.count(palette.warning), 0);
    }

    #[test]
    fn low_battery_is_red() {
        let palette = Palette::new(&Capabilities::FULL);
        let mut frame = Frame::new(Size::new(30, 20));
        draw_icon(&mut frame, Point::new(2, 2), &BatteryChargeState::new(15, false), &palette)
            .unwrap();

        assert_eq!(frame.pixel(Point::new(4, 4)), Some(palette.warning));
        assert_eq!(frame.pixel(Point::new(2, 2)), Some(palette.text));
    }
}
