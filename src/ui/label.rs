//! Text label

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyleBuilder},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use embedded_text::{
    alignment::{HorizontalAlignment, VerticalAlignment},
    style::TextBoxStyleBuilder,
    TextBox,
};
use heapless::String;

/// Maximum label length in bytes
pub const LABEL_LEN: usize = 32;

/// A line of text with its own colors and bounds
#[derive(Clone)]
pub struct Label {
    text: String<LABEL_LEN>,
    /// Text color
    pub color: Rgb565,
    /// Fill behind the text, covering the whole bounds
    pub background: Rgb565,
    bounds: Rectangle,
    font: &'static MonoFont<'static>,
    alignment: HorizontalAlignment,
}

impl Label {
    /// Create new label
    pub fn new(
        text: &str,
        bounds: Rectangle,
        font: &'static MonoFont<'static>,
        alignment: HorizontalAlignment,
        color: Rgb565,
        background: Rgb565,
    ) -> Self {
        let mut label = Self {
            text: String::new(),
            color,
            background,
            bounds,
            font,
            alignment,
        };
        label.set_text(text);
        label
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Replace the text, cutting it at [`LABEL_LEN`] bytes.
    ///
    /// Returns whether the text changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text.as_str() == text {
            return false;
        }
        self.text.clear();
        for c in text.chars() {
            if self.text.push(c).is_err() {
                break;
            }
        }
        true
    }

    /// Returns whether the color changed.
    pub fn set_color(&mut self, color: Rgb565) -> bool {
        core::mem::replace(&mut self.color, color) != color
    }

    /// Returns whether the background changed.
    pub fn set_background(&mut self, background: Rgb565) -> bool {
        core::mem::replace(&mut self.background, background) != background
    }

    /// Draw the label onto `target`
    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(self.background))
            .draw(target)?;

        let character_style = MonoTextStyleBuilder::new()
            .font(self.font)
            .text_color(self.color)
            .background_color(self.background)
            .build();
        let textbox_style = TextBoxStyleBuilder::new()
            .alignment(self.alignment)
            .vertical_alignment(VerticalAlignment::Middle)
            .build();

        TextBox::with_textbox_style(
            self.text.as_str(),
            self.bounds,
            character_style,
            textbox_style,
        )
        .draw(target)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::Frame;

    fn label(text: &str) -> Label {
        Label::new(
            text,
            Rectangle::new(Point::new(2, 2), Size::new(40, 12)),
            &profont::PROFONT_7_POINT,
            HorizontalAlignment::Left,
            Rgb565::WHITE,
            Rgb565::BLUE,
        )
    }

    #[test]
    fn set_text_reports_changes() {
        let mut label = label("80%");
        assert!(!label.set_text("80%"));
        assert!(label.set_text("Charging"));
        assert_eq!(label.text(), "Charging");
    }

    #[test]
    fn long_text_is_cut() {
        let long = "a".repeat(LABEL_LEN + 10);
        assert_eq!(label(&long).text().len(), LABEL_LEN);
    }

    #[test]
    fn color_changes() {
        let mut label = label("x");
        assert!(!label.set_background(Rgb565::BLUE));
        assert!(label.set_background(Rgb565::RED));
        assert!(label.set_color(Rgb565::GREEN));
        assert!(!label.set_color(Rgb565::GREEN));
    }

    #[test]
    fn draw_fills_bounds() {
        let mut frame = Frame::new(Size::new(48, 16));
        label("12").draw(&mut frame).unwrap();

        assert_eq!(frame.pixel(Point::new(0, 0)), None);
        assert_eq!(frame.pixel(Point::new(41, 13)), Some(Rgb565::BLUE));
        assert!(frame.count(Rgb565::WHITE) > 0);
    }
}
