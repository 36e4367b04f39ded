//! Watch face configuration

/// What the target hardware can do.
///
/// Checked once at startup and consulted wherever behaviour differs
/// between targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    /// Display can show arbitrary colors (as opposed to black and white)
    pub color: bool,
    /// A health data service is available
    pub health: bool,
}

impl Capabilities {
    /// Color display with a health service
    pub const FULL: Self = Self {
        color: true,
        health: true,
    };
    /// Black and white display without health data
    pub const MONOCHROME: Self = Self {
        color: false,
        health: false,
    };
}

/// Hour format of the time label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockStyle {
    /// "9:05" style with hours 1–12
    TwelveHour,
    /// "09:05" style with hours 0–23
    #[default]
    TwentyFourHour,
}

/// Complete watch face configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchConfig {
    pub capabilities: Capabilities,
    pub clock_style: ClockStyle,
    /// Offset of local time from UTC in seconds
    pub utc_offset: i32,
}

impl WatchConfig {
    /// Create new configuration for the given hardware
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            clock_style: ClockStyle::default(),
            utc_offset: 0,
        }
    }

    /// Use the given hour format
    pub fn with_clock_style(mut self, clock_style: ClockStyle) -> Self {
        self.clock_style = clock_style;
        self
    }

    /// Use the given offset from UTC in seconds
    pub fn with_utc_offset(mut self, utc_offset: i32) -> Self {
        self.utc_offset = utc_offset;
        self
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new(Capabilities::FULL)
    }
}
