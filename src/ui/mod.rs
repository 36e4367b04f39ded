//! UI definitions module
//!
//! Geometry follows a 144×168 face; the firmware centres it on its panel.

use embedded_graphics::{
    geometry::{Point, Size},
    mono_font::MonoFont,
    pixelcolor::{Rgb565, Rgb888, RgbColor},
    primitives::Rectangle,
};

use crate::system::config::Capabilities;

pub mod battery;
pub mod clock;
pub mod connectivity;
pub mod face;
pub mod health;
pub mod label;

pub use face::DisplayState;
pub use label::Label;

/// Size of the face
pub const FACE_SIZE: Size = Size::new(144, 168);

pub const TIME_BOUNDS: Rectangle = Rectangle::new(Point::new(0, 72), Size::new(144, 56));
pub const DATE_BOUNDS: Rectangle = Rectangle::new(Point::new(0, 140), Size::new(144, 28));
pub const BATTERY_PERCENT_BOUNDS: Rectangle =
    Rectangle::new(Point::new(28, 2), Size::new(47, 13));
pub const BATTERY_ICON_BOUNDS: Rectangle = Rectangle::new(Point::new(2, 2), Size::new(26, 13));
pub const BLUETOOTH_BOUNDS: Rectangle = Rectangle::new(Point::new(75, 2), Size::new(69, 13));
pub const STEPS_BOUNDS: Rectangle = Rectangle::new(Point::new(2, 25), Size::new(142, 28));
pub const KCAL_BOUNDS: Rectangle = Rectangle::new(Point::new(2, 53), Size::new(142, 28));

/// Fonts used by the face, loaded once and kept for the program lifetime
#[derive(Clone, Copy)]
pub struct Fonts {
    /// Digits of the time label
    pub large: &'static MonoFont<'static>,
    /// Date and health labels
    pub medium: &'static MonoFont<'static>,
    /// Battery and bluetooth labels
    pub small: &'static MonoFont<'static>,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            large: &profont::PROFONT_24_POINT,
            medium: &profont::PROFONT_14_POINT,
            small: &profont::PROFONT_7_POINT,
        }
    }
}

/// Colors of the face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Connected bluetooth label
    pub accent: Rgb565,
    /// Lost connection, low battery
    pub warning: Rgb565,
    /// Battery running low
    pub caution: Rgb565,
    /// Battery fine
    pub good: Rgb565,
    /// Time and health labels
    pub highlight: Rgb565,
    /// Plain text and icon outline
    pub text: Rgb565,
    /// Default background
    pub background: Rgb565,
}

impl Palette {
    /// Pick the palette for the given display.
    ///
    /// Black and white displays show every color as white.
    pub fn new(capabilities: &Capabilities) -> Self {
        let pick = |color: Rgb565| {
            if capabilities.color {
                color
            } else {
                Rgb565::WHITE
            }
        };
        Self {
            accent: pick(rgb(0x55, 0xAA, 0xFF)),
            warning: pick(Rgb565::RED),
            caution: pick(rgb(0xFF, 0x55, 0x00)),
            good: pick(Rgb565::GREEN),
            highlight: pick(rgb(0x55, 0xFF, 0x00)),
            text: Rgb565::WHITE,
            background: Rgb565::BLACK,
        }
    }
}

/// Background of the high contrast theme
pub const HIGH_CONTRAST_BACKGROUND: Rgb565 = Rgb565::BLACK;
/// Background forced on black and white displays when a color is requested
pub const TWO_TONE_BACKGROUND: Rgb565 = Rgb565::WHITE;

/// Convert an 8 bit per channel color to the display format
pub fn rgb(red: u8, green: u8, blue: u8) -> Rgb565 {
    Rgb888::new(red, green, blue).into()
}

#[cfg(test)]
pub(crate) mod testing {
    use core::convert::Infallible;

    use embedded_graphics::{
        geometry::{OriginDimensions, Point, Size},
        pixelcolor::Rgb565,
        prelude::{DrawTarget, Pixel},
    };

    /// Framebuffer for checking rendered output
    pub struct Frame {
        size: Size,
        pixels: Vec<Option<Rgb565>>,
    }

    impl Frame {
        pub fn new(size: Size) -> Self {
            Self {
                size,
                pixels: vec![None; (size.width * size.height) as usize],
            }
        }

        /// Color at `point`, `None` if nothing was drawn there
        pub fn pixel(&self, point: Point) -> Option<Rgb565> {
            let index = point.y as usize * self.size.width as usize + point.x as usize;
            self.pixels[index]
        }

        pub fn count(&self, color: Rgb565) -> usize {
            self.pixels.iter().filter(|&&p| p == Some(color)).count()
        }
    }

    impl OriginDimensions for Frame {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for Frame {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if point.x >= 0
                    && point.y >= 0
                    && (point.x as u32) < self.size.width
                    && (point.y as u32) < self.size.height
                {
                    let index = point.y as usize * self.size.width as usize + point.x as usize;
                    self.pixels[index] = Some(color);
                }
            }
            Ok(())
        }
    }
}
