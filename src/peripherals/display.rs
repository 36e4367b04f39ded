//! Display control module for PineTime

use embassy_nrf::{
    gpio::Output,
    peripherals::{P0_18, P0_25, P0_26, SPI2},
    spim::Spim,
};
use embassy_time::Delay;

use display_interface_spi::SPIInterface;
use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::Rectangle};
use fitface::{
    settings::store::KeyValueStore,
    ui::{health::HealthService, FACE_SIZE},
    Watchface,
};
use mipidsi::{models::ST7789, Builder, Orientation};

const LCD_W: u16 = 240;
const LCD_H: u16 = 240;

type Lcd = mipidsi::Display<
    SPIInterface<Spim<'static, SPI2>, Output<'static, P0_18>, Output<'static, P0_25>>,
    ST7789,
    Output<'static, P0_26>,
>;

pub struct Display {
    lcd: Lcd,
    /// Area of the panel showing the face
    face_area: Rectangle,
    /// Background the margins around the face were last cleared to
    margin_color: Option<Rgb565>,
}

impl Display {
    /// Configure display settings on boot
    pub fn init(
        spim: Spim<'static, SPI2>,
        cs_pin: Output<'static, P0_25>,
        dc_pin: Output<'static, P0_18>,
        rst_pin: Output<'static, P0_26>,
    ) -> Result<Self, Error> {
        let lcd = Builder::st7789(SPIInterface::new(spim, dc_pin, cs_pin))
            .with_display_size(LCD_W, LCD_H)
            .with_orientation(Orientation::Portrait(false))
            .init(&mut Delay, Some(rst_pin))
            .map_err(|_| Error::Init)?;

        // Centre the face on the panel
        let offset = Point::new(
            (LCD_W as i32 - FACE_SIZE.width as i32) / 2,
            (LCD_H as i32 - FACE_SIZE.height as i32) / 2,
        );

        Ok(Self {
            lcd,
            face_area: Rectangle::new(offset, FACE_SIZE),
            margin_color: None,
        })
    }

    /// Draw the watch face
    pub fn draw<S, H>(&mut self, watchface: &Watchface<S, H>) -> Result<(), Error>
    where
        S: KeyValueStore,
        H: HealthService,
    {
        let background = watchface.display().background;
        if self.margin_color != Some(background) {
            self.lcd.clear(background).map_err(|_| Error::Draw)?;
            self.margin_color = Some(background);
        }

        let mut face = self.lcd.cropped(&self.face_area);
        watchface.render(&mut face).map_err(|_| Error::Draw)
    }
}

#[derive(Debug, defmt::Format)]
pub enum Error {
    Init,
    Draw,
}
