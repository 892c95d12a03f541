use ads1299::ADS1299RegisterError;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SpiE> {
    Ads(ads1299::Error<SpiE>),
    /// No ADS1299 was identified at boot.
    DeviceAbsent,
    NoClient,
    NoActiveChannels,
}

impl<SpiE> Error<SpiE> {
    /// Short description that does not need `SpiE` to be printable.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::Ads(ads1299::Error::SpiError(_)) => "SPI transfer failed",
            Error::Ads(ads1299::Error::RegisterError(_)) => "register error",
            Error::DeviceAbsent => "device absent",
            Error::NoClient => "no client attached",
            Error::NoActiveChannels => "no active channels",
        }
    }
}

impl<SpiE> From<ads1299::Error<SpiE>> for Error<SpiE> {
    fn from(e: ads1299::Error<SpiE>) -> Self {
        Error::Ads(e)
    }
}

impl<SpiE> From<ADS1299RegisterError> for Error<SpiE> {
    fn from(e: ADS1299RegisterError) -> Self {
        Error::Ads(e.into())
    }
}

impl<E: core::fmt::Display> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Ads(e) => write!(f, "{}", e),
            other => f.write_str(other.as_str()),
        }
    }
}
