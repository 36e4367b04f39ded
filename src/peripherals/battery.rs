//! Battery status check
//!
//! Implementation based upon https://github.com/dbrgn/pinetime-rtic/blob/master/pinetime-rtic/src/battery.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use embassy_nrf::{gpio::Input, peripherals::P0_12, saadc::Saadc};
use fitface::BatteryChargeState;

/// Battery API
pub struct Battery {
    /// ADC instance for battery voltage measurement
    adc: Saadc<'static, 1>,
    /// Charge indication pin:
    /// high = battery, low = charging
    pin_charge_indication: Input<'static, P0_12>,
    /// Last reported state
    last: Option<BatteryChargeState>,
}

impl Battery {
    /// Configure battery settings on boot
    pub fn init(adc: Saadc<'static, 1>, charge_pin: Input<'static, P0_12>) -> Self {
        Self {
            adc,
            pin_charge_indication: charge_pin,
            last: None,
        }
    }

    /// Carging state of the battery
    pub fn is_charging(&self) -> bool {
        self.pin_charge_indication.is_low()
    }

    /// Battery capacity in percent
    pub async fn get_percent(&mut self) -> u8 {
        let voltage = self.get_voltage().await;

        // Use fixed data points and linear interpolation in between
        // to estimate battery capacity.
        (match voltage {
            0..=3449 => 0,
            3450..=3699 => (voltage - 3450) / 5,
            3700..=4199 => 50 + (voltage - 3700) / 10,
            _ => 100,
        }) as u8
    }

    /// Read the current battery state
    pub async fn read(&mut self) -> BatteryChargeState {
        let percent = self.get_percent().await;
        BatteryChargeState::new(percent, self.is_charging())
    }

    /// Read the battery and return the new state if it differs from the
    /// last reported one.
    pub async fn update(&mut self) -> Option<BatteryChargeState> {
        let state = self.read().await;
        if self.last == Some(state) {
            return None;
        }
        self.last = Some(state);
        Some(state)
    }

    /// Battery voltage in millivolts
    async fn get_voltage(&mut self) -> u16 {
        let mut buf = [0; 1];
        self.adc.sample(&mut buf).await;
        // For detailed explanation of formula check https://wiki.pine64.org/wiki/PineTime
        // Use u32 during calculation to prevent overflow
        (buf[0].max(0) as u32 * 2000 / 1241) as u16
    }
}
