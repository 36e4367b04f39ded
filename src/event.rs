//! Events delivered to the watch face

use chrono::NaiveDateTime;

use crate::settings::message::Dictionary;

/// Battery reading as reported by the charger hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryChargeState {
    /// Charge in percent (0–100)
    pub charge_percent: u8,
    /// Whether the watch sits on the charger
    pub is_charging: bool,
}

impl BatteryChargeState {
    /// Create a new battery reading, clamping the charge to 100%.
    pub fn new(charge_percent: u8, is_charging: bool) -> Self {
        Self {
            charge_percent: charge_percent.min(100),
            is_charging,
        }
    }
}

/// Kind of update reported by the health service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthEvent {
    SignificantUpdate,
    MovementUpdate,
    SleepUpdate,
}

impl HealthEvent {
    /// Whether the summary labels have to be recomputed for this event.
    ///
    /// Sleep updates don't touch steps or calories.
    pub fn refreshes_summary(&self) -> bool {
        match self {
            HealthEvent::SignificantUpdate | HealthEvent::MovementUpdate => true,
            HealthEvent::SleepUpdate => false,
        }
    }
}

/// Everything the watch face reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new minute started
    Tick(NaiveDateTime),
    BatteryChanged(BatteryChargeState),
    /// Link to the companion app came up (`true`) or went down
    ConnectivityChanged(bool),
    HealthChanged(HealthEvent),
    /// Settings pushed by the companion app
    MessageReceived(Dictionary),
}
