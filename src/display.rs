use anyhow::Result;
use embedded_hal::spi::MODE_0;
use epd_waveshare::epd7in5_v2::{Display7in5, Epd7in5};
use epd_waveshare::prelude::*;
use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Input, Output, PinDriver};
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig, SPI3};
use esp_idf_hal::units::FromValueType;
use log::info;

use crate::config::DriverBoard;

type EpdDriver<'a> = Epd7in5<
    SpiDeviceDriver<'a, SpiDriver<'a>>,
    PinDriver<'a, AnyInputPin, Input>,
    PinDriver<'a, AnyOutputPin, Output>,
    PinDriver<'a, AnyOutputPin, Output>,
    Delay,
>;

pub struct PanelPins {
    pub sclk: AnyOutputPin,
    pub mosi: AnyOutputPin,
    pub cs: AnyOutputPin,
    pub busy: AnyInputPin,
    pub dc: AnyOutputPin,
    pub rst: AnyOutputPin,
    pub pwr: AnyOutputPin,
}

/// The 7.5" panel behind its switched supply rail. Construction powers
/// the rail and runs the controller's init sequence, so this is deferred
/// until a frame is actually needed.
pub struct Panel<'a> {
    spi: SpiDeviceDriver<'a, SpiDriver<'a>>,
    epd: EpdDriver<'a>,
    pwr: PinDriver<'a, AnyOutputPin, Output>,
    delay: Delay,
}

impl Panel<'static> {
    pub fn power_on(spi: SPI3, pins: PanelPins, board: DriverBoard) -> Result<Self> {
        let mut pwr = PinDriver::output(pins.pwr)?;
        pwr.set_high()?;

        let driver = SpiDriver::new(
            spi,
            pins.sclk,
            pins.mosi,
            None::<AnyIOPin>,
            &SpiDriverConfig::new(),
        )?;
        let config = SpiConfig::new().baudrate(4.MHz().into()).data_mode(MODE_0);
        let mut spi = SpiDeviceDriver::new(driver, Some(pins.cs), &config)?;

        let busy = PinDriver::input(pins.busy)?;
        let dc = PinDriver::output(pins.dc)?;
        let rst = PinDriver::output(pins.rst)?;

        // The Waveshare carrier buffers BUSY through a transistor and
        // wants a coarser poll; the DESPI-C02 breaks the line out directly.
        let busy_poll_us = match board {
            DriverBoard::Waveshare => Some(10_000),
            DriverBoard::DespiC02 => None,
        };
        let mut delay = Delay::new_default();
        let epd = Epd7in5::new(&mut spi, busy, dc, rst, &mut delay, busy_poll_us)?;
        info!("EPD powered on and initialized");

        Ok(Panel {
            spi,
            epd,
            pwr,
            delay,
        })
    }
}

impl Panel<'_> {
    /// Push a frame and run the full refresh. Blocks for the several
    /// seconds the panel needs.
    pub fn show(&mut self, frame: &Display7in5) -> Result<()> {
        self.epd
            .update_frame(&mut self.spi, frame.buffer(), &mut self.delay)?;
        self.epd.display_frame(&mut self.spi, &mut self.delay)?;
        Ok(())
    }

    /// Deep-sleep the controller and cut the supply rail.
    pub fn power_off(mut self) -> Result<()> {
        self.epd.sleep(&mut self.spi, &mut self.delay)?;
        self.pwr.set_low()?;
        info!("EPD powered off");
        Ok(())
    }
}
