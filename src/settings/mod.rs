//! Display settings pushed by the companion app

pub mod message;
pub mod store;

use crate::system::config::Capabilities;
use message::Dictionary;
use store::KeyValueStore;

pub const KEY_COLOR_RED_BG: u32 = 0;
pub const KEY_COLOR_GREEN_BG: u32 = 1;
pub const KEY_COLOR_BLUE_BG: u32 = 2;
pub const KEY_HIGH_CONTRAST: u32 = 3;

/// Number of persisted keys
pub const KEY_COUNT: usize = 4;

/// Background color as three 8 bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BackgroundColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl BackgroundColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Build a color from raw channel values, clamping each into 0–255.
    pub fn from_channels(red: i32, green: i32, blue: i32) -> Self {
        let clamp = |value: i32| value.clamp(0, u8::MAX as i32) as u8;
        Self::new(clamp(red), clamp(green), clamp(blue))
    }

    /// Persist all three channels.
    ///
    /// Callers flush the store after the whole message is handled, so the
    /// channels reach flash together.
    pub fn persist<S: KeyValueStore>(&self, store: &mut S) -> Result<(), store::Error> {
        store.write_int(KEY_COLOR_RED_BG, self.red as i32)?;
        store.write_int(KEY_COLOR_GREEN_BG, self.green as i32)?;
        store.write_int(KEY_COLOR_BLUE_BG, self.blue as i32)
    }
}

/// Settings as persisted between launches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplaySettings {
    pub high_contrast: bool,
    /// Custom background, if the companion app ever sent one
    pub background: Option<BackgroundColor>,
}

impl DisplaySettings {
    /// Load the settings from `store`, falling back to defaults.
    ///
    /// The color is only restored when all three channels are stored.
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        let high_contrast = store.read_bool(KEY_HIGH_CONTRAST).unwrap_or(false);
        let background = match (
            store.read_int(KEY_COLOR_RED_BG),
            store.read_int(KEY_COLOR_GREEN_BG),
            store.read_int(KEY_COLOR_BLUE_BG),
        ) {
            (Some(red), Some(green), Some(blue)) => {
                Some(BackgroundColor::from_channels(red, green, blue))
            }
            _ => None,
        };
        Self {
            high_contrast,
            background,
        }
    }
}

/// What an incoming message asks the background to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackgroundUpdate {
    /// No complete color in the message
    Unchanged,
    /// Monochrome target: fixed white background, nothing persisted
    TwoTone,
    /// Persist and apply this color
    Color(BackgroundColor),
}

/// Decision taken for one incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettingsUpdate {
    /// New high contrast flag. Always persisted, absence counts as `false`.
    pub high_contrast: bool,
    pub background: BackgroundUpdate,
}

/// Decide what a companion message changes.
///
/// Never fails: missing or malformed fields leave their setting alone,
/// which keeps newer companion apps from breaking the face.
pub fn decode(message: &Dictionary, capabilities: &Capabilities) -> SettingsUpdate {
    let high_contrast = message
        .integer(KEY_HIGH_CONTRAST)
        .is_some_and(|flag| flag > 0);

    let background = match (
        message.integer(KEY_COLOR_RED_BG),
        message.integer(KEY_COLOR_GREEN_BG),
        message.integer(KEY_COLOR_BLUE_BG),
    ) {
        (Some(_), Some(_), Some(_)) if !capabilities.color => BackgroundUpdate::TwoTone,
        (Some(red), Some(green), Some(blue)) => {
            BackgroundUpdate::Color(BackgroundColor::from_channels(red, green, blue))
        }
        _ => BackgroundUpdate::Unchanged,
    };

    SettingsUpdate {
        high_contrast,
        background,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message::Value;
    use store::RecordStore;

    fn message(tuples: &[(u32, i32)]) -> Dictionary {
        let mut dict = Dictionary::new();
        for &(key, value) in tuples {
            dict.insert(key, Value::Int(value)).unwrap();
        }
        dict
    }

    #[test]
    fn high_contrast_flag() {
        let caps = Capabilities::FULL;
        assert!(decode(&message(&[(3, 1)]), &caps).high_contrast);
        assert!(!decode(&message(&[(3, 0)]), &caps).high_contrast);
        assert!(!decode(&message(&[(3, -1)]), &caps).high_contrast);
        assert!(!decode(&message(&[]), &caps).high_contrast);
    }

    #[test]
    fn flag_alone_leaves_color() {
        let update = decode(&message(&[(3, 1)]), &Capabilities::FULL);
        assert_eq!(update.background, BackgroundUpdate::Unchanged);
    }

    #[test]
    fn partial_color_is_ignored() {
        let update = decode(&message(&[(0, 10), (1, 20)]), &Capabilities::FULL);
        assert_eq!(update.background, BackgroundUpdate::Unchanged);
        assert!(!update.high_contrast);
    }

    #[test]
    fn full_color_on_color_target() {
        let update = decode(&message(&[(0, 10), (1, 20), (2, 30)]), &Capabilities::FULL);
        assert_eq!(
            update.background,
            BackgroundUpdate::Color(BackgroundColor::new(10, 20, 30))
        );
    }

    #[test]
    fn full_color_on_monochrome_target() {
        let update = decode(
            &message(&[(0, 10), (1, 20), (2, 30)]),
            &Capabilities::MONOCHROME,
        );
        assert_eq!(update.background, BackgroundUpdate::TwoTone);
    }

    #[test]
    fn channels_are_clamped() {
        let update = decode(&message(&[(0, 300), (1, -4), (2, 255)]), &Capabilities::FULL);
        assert_eq!(
            update.background,
            BackgroundUpdate::Color(BackgroundColor::new(255, 0, 255))
        );
    }

    #[test]
    fn load_requires_complete_triple() {
        let mut store = RecordStore::new();
        store.write_int(KEY_COLOR_RED_BG, 1).unwrap();
        store.write_int(KEY_COLOR_GREEN_BG, 2).unwrap();
        assert_eq!(DisplaySettings::load(&store), DisplaySettings::default());

        store.write_int(KEY_COLOR_BLUE_BG, 3).unwrap();
        store.write_bool(KEY_HIGH_CONTRAST, true).unwrap();
        assert_eq!(
            DisplaySettings::load(&store),
            DisplaySettings {
                high_contrast: true,
                background: Some(BackgroundColor::new(1, 2, 3)),
            }
        );
    }
}
