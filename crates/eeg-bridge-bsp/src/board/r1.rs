use embassy_nrf::interrupt::Priority;
use embassy_nrf::peripherals::{self, WDT};
use embassy_nrf::Peri;

use crate::usb;

/// Control and data-ready lines of the ADS1299.
pub struct AdsResources {
    pub pwdn: Peri<'static, peripherals::P0_22>,
    pub reset: Peri<'static, peripherals::P0_20>,
    pub start: Peri<'static, peripherals::P0_19>,
    pub cs: Peri<'static, peripherals::P1_12>,
    pub drdy: Peri<'static, peripherals::P0_21>,
}

pub struct Spi3BusResources {
    pub sclk: Peri<'static, peripherals::P1_15>,
    pub mosi: Peri<'static, peripherals::P1_13>,
    pub miso: Peri<'static, peripherals::P1_14>,
    pub spim: Peri<'static, peripherals::SPI3>,
}

/// Peripherals of the EEG bridge board used by the firmware.
pub struct EegBridge {
    /// Peripherals for the ADS1299.
    pub ads_resources: AdsResources,
    /// Peripherals for the SPI 3 bus.
    pub spi3_bus_resources: Spi3BusResources,
    /// Watchdog Timer.
    pub wdt: Peri<'static, WDT>,
    /// USB device peripheral.
    pub usb: usb::UsbDriverBuilder,
}

impl Default for EegBridge {
    fn default() -> Self {
        let mut config = embassy_nrf::config::Config::default();
        // DRDY edges must not wait behind USB or the time driver.
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;
        Self::new(config)
    }
}

impl EegBridge {
    /// Create a new instance based on HAL configuration
    pub fn new(config: embassy_nrf::config::Config) -> Self {
        let p = embassy_nrf::init(config);

        Self {
            ads_resources: AdsResources {
                pwdn: p.P0_22,
                reset: p.P0_20,
                start: p.P0_19,
                cs: p.P1_12,
                drdy: p.P0_21,
            },
            spi3_bus_resources: Spi3BusResources {
                sclk: p.P1_15,
                mosi: p.P1_13,
                miso: p.P1_14,
                spim: p.SPI3,
            },
            wdt: p.WDT,
            usb: usb::UsbDriverBuilder::new(p.USBD),
        }
    }
}
