use crate::board::{AdsResources, Spi3BusResources};
use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Input, Level, Output, OutputDrive, Pull},
    interrupt::{self, InterruptExt},
    peripherals, spim,
};
use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embassy_time::Timer;

/// SPIM3 behind a mutex so the ADS device can borrow it per transaction.
pub type SpiBus<MutexType> = Mutex<MutexType, spim::Spim<'static>>;

/// The ADS1299 chip-select device on SPIM3.
pub type AdsSpi<MutexType> =
    SpiDevice<'static, MutexType, spim::Spim<'static>, Output<'static>>;

/// Control and data-ready lines of a powered ADS1299.
///
/// Keep these alive for as long as the device is in use: dropping them
/// releases the pins and powers the chip down.
pub struct AdsPins {
    pub drdy: Input<'static>,
    /// Held low; conversions are started with the START opcode.
    pub start: Output<'static>,
    pub reset: Output<'static>,
    pub pwdn: Output<'static>,
}

/// A powered, freshly reset ADS1299.
pub struct AdsHardware<MutexType: RawMutex + 'static> {
    pub spi: AdsSpi<MutexType>,
    pub pins: AdsPins,
}

bind_interrupts!(struct SpiIrq {
    SPIM3 => spim::InterruptHandler<peripherals::SPI3>;
});

impl AdsResources {
    /// Powers the ADS up, pulses RESET with the datasheet timings and
    /// returns its SPI device and control lines.
    pub async fn configure<MutexType: RawMutex>(
        self,
        bus: &'static SpiBus<MutexType>,
    ) -> AdsHardware<MutexType> {
        let start = Output::new(self.start, Level::Low, OutputDrive::Standard);
        let mut reset = Output::new(self.reset, Level::High, OutputDrive::Standard);
        let pwdn = Output::new(self.pwdn, Level::High, OutputDrive::Standard);
        let drdy = Input::new(self.drdy, Pull::None);

        Timer::after_nanos(ads1299::MIN_T_POR as u64).await;
        reset.set_low();
        Timer::after_nanos(ads1299::MIN_T_RST as u64).await;
        reset.set_high();
        Timer::after_nanos(ads1299::MIN_RST_WAIT as u64).await;

        let cs = Output::new(self.cs, Level::High, OutputDrive::Standard);

        AdsHardware {
            spi: SpiDevice::new(bus, cs),
            pins: AdsPins { drdy, start, reset, pwdn },
        }
    }
}

impl Spi3BusResources {
    pub fn get_bus<MutexType: RawMutex>(self) -> SpiBus<MutexType> {
        let mut config = spim::Config::default();
        config.mode = spim::MODE_1;
        config.frequency = spim::Frequency::M4;
        config.mosi_drive = OutputDrive::HighDrive;
        config.sck_drive = OutputDrive::HighDrive;
        interrupt::SPIM3.set_priority(interrupt::Priority::P3);
        Mutex::new(spim::Spim::new(
            self.spim, SpiIrq, self.sclk, self.miso, self.mosi, config,
        ))
    }
}
