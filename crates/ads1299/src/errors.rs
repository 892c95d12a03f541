use core;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SpiE> {
    SpiError(SpiE),
    RegisterError(ADS1299RegisterError),
}

impl<E: core::fmt::Display> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::SpiError(err) => {
                write!(f, "SPI communication error: {}", err)
            }
            Error::RegisterError(value) => {
                write!(f, "Register Error: {}", value)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ADS1299RegisterError {
    InvalidSamplingRate(u8),
    InvalidChannelCount(u8),
    InvalidRegister(u8),
    ReadOnlyRegister(u8),
    /// Holds the raw ID register value that failed to match.
    AdsNotDetected(u8),
}

impl core::fmt::Display for ADS1299RegisterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ADS1299RegisterError::InvalidSamplingRate(value) => {
                write!(f, "Invalid sampling rate value: {}", value)
            }
            ADS1299RegisterError::InvalidChannelCount(value) => {
                write!(f, "Invalid channel count value: {}", value)
            }
            ADS1299RegisterError::InvalidRegister(addr) => {
                write!(f, "Invalid register address: {:#04x}", addr)
            }
            ADS1299RegisterError::ReadOnlyRegister(addr) => {
                write!(f, "Register {:#04x} is read-only", addr)
            }
            ADS1299RegisterError::AdsNotDetected(id) => {
                write!(f, "Ads not detected! (ID {:#04x})", id)
            }
        }
    }
}

impl<SpiE> From<ADS1299RegisterError> for Error<SpiE> {
    fn from(e: ADS1299RegisterError) -> Self {
        Error::RegisterError(e)
    }
}
