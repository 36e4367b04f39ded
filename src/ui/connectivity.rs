//! Bluetooth status label

use embedded_graphics::pixelcolor::Rgb565;

use super::Palette;

/// Text and color of the bluetooth label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityLabel {
    pub text: &'static str,
    pub color: Rgb565,
}

impl ConnectivityLabel {
    pub fn new(connected: bool, palette: &Palette) -> Self {
        if connected {
            Self {
                text: "Bluetooth",
                color: palette.accent,
            }
        } else {
            Self {
                text: "No connection",
                color: palette.warning,
            }
        }
    }
}
