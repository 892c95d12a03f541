//! USBD with hardware VBUS detection.
use embassy_nrf::peripherals;
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::Peri;
use embassy_nrf::{bind_interrupts, usb};

/// The USB driver type handed to `embassy-usb`.
pub type UsbDriver = Driver<'static, HardwareVbusDetect>;

/// Holds the USBD peripheral until the USB stack is brought up.
pub struct UsbDriverBuilder {
    usbd: Peri<'static, peripherals::USBD>,
}

bind_interrupts!(pub struct UsbIrqs {
    USBD => usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => usb::vbus_detect::InterruptHandler;
});

impl UsbDriverBuilder {
    pub(crate) fn new(usbd: Peri<'static, peripherals::USBD>) -> Self {
        Self { usbd }
    }

    pub fn init(self) -> UsbDriver {
        Driver::new(self.usbd, UsbIrqs, HardwareVbusDetect::new(UsbIrqs))
    }
}
