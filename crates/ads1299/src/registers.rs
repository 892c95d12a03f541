use super::errors::ADS1299RegisterError;
use bitflags::bitflags;

/// Number of register addresses exposed by the device.
pub const REGISTER_COUNT: usize = 24;

/// Maximum number of channels in the family.
pub const MAX_CHANNELS: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    WAKEUP,
    STANDBY,
    RESET,
    START,
    STOP,
    RDATAC,
    SDATAC,
    RDATA,
    /// Read `n` registers starting at the given address.
    RREG(Register, u8),
    /// Write `n` registers starting at the given address.
    WREG(Register, u8),
}

impl Command {
    /// First opcode byte.
    pub const fn opcode(self) -> u8 {
        match self {
            Command::WAKEUP => 0x02,
            Command::STANDBY => 0x04,
            Command::RESET => 0x06,
            Command::START => 0x08,
            Command::STOP => 0x0A,
            Command::RDATAC => 0x10,
            Command::SDATAC => 0x11,
            Command::RDATA => 0x12,
            Command::RREG(reg, _) => 0x20 | reg as u8,
            Command::WREG(reg, _) => 0x40 | reg as u8,
        }
    }
}

impl From<Command> for ([u8; 2], usize) {
    fn from(val: Command) -> Self {
        match val {
            Command::RREG(_, n) | Command::WREG(_, n) => {
                ([val.opcode(), n.saturating_sub(1)], 2)
            }
            _ => ([val.opcode(), 0], 1),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    #[default]
    Sps250,
    Sps500,
    KSps1,
    KSps2,
    KSps4,
    KSps8,
    KSps16,
}

impl SampleRate {
    /// Rates ordered by index, slowest first.
    pub const ALL: [SampleRate; 7] = [
        SampleRate::Sps250,
        SampleRate::Sps500,
        SampleRate::KSps1,
        SampleRate::KSps2,
        SampleRate::KSps4,
        SampleRate::KSps8,
        SampleRate::KSps16,
    ];

    /// Index 0 is 250 SPS, each step doubles the rate.
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < Self::ALL.len() {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn hz(self) -> u32 {
        250 << self.index()
    }

    /// DR field value in CONFIG1.
    pub const fn code(self) -> u8 {
        6 - self.index()
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ILeadOff {
    #[default]
    _6nA,
    _24nA,
    _6uA,
    _24uA,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FLeadOff {
    #[default]
    Dc,
    Ac7_8,
    Ac31_2,
    AcFdrBy4,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    X1,
    X2,
    X4,
    X6,
    X8,
    X12,
    #[default]
    X24,
}

impl Gain {
    /// Raw 3-bit GAIN field.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mux {
    #[default]
    NormalElectrodeInput,
    InputShorted,
    BiasMeasure,
    Mvdd,
    TemperatureSensor,
    TestSignal,
    BiasDrp,
    BiasDrn,
}

impl Mux {
    pub const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0b000 => Mux::NormalElectrodeInput,
            0b001 => Mux::InputShorted,
            0b010 => Mux::BiasMeasure,
            0b011 => Mux::Mvdd,
            0b100 => Mux::TemperatureSensor,
            0b101 => Mux::TestSignal,
            0b110 => Mux::BiasDrp,
            _ => Mux::BiasDrn,
        }
    }
}

/// Register addresses.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Factory-programmed, read-only.
    ID = 0x00,
    CONFIG1 = 0x01,
    CONFIG2 = 0x02,
    CONFIG3 = 0x03,
    LOFF = 0x04,
    CH1SET = 0x05,
    CH2SET = 0x06,
    CH3SET = 0x07,
    CH4SET = 0x08,
    CH5SET = 0x09,
    CH6SET = 0x0A,
    CH7SET = 0x0B,
    CH8SET = 0x0C,
    BIAS_SENSP = 0x0D,
    BIAS_SENSN = 0x0E,
    LOFF_SENSP = 0x0F,
    LOFF_SENSN = 0x10,
    LOFF_FLIP = 0x11,
    /// Read-only.
    LOFF_STATP = 0x12,
    /// Read-only.
    LOFF_STATN = 0x13,
    GPIO = 0x14,
    MISC1 = 0x15,
    MISC2 = 0x16,
    CONFIG4 = 0x17,
}

impl Register {
    const ALL: [Register; REGISTER_COUNT] = [
        Register::ID,
        Register::CONFIG1,
        Register::CONFIG2,
        Register::CONFIG3,
        Register::LOFF,
        Register::CH1SET,
        Register::CH2SET,
        Register::CH3SET,
        Register::CH4SET,
        Register::CH5SET,
        Register::CH6SET,
        Register::CH7SET,
        Register::CH8SET,
        Register::BIAS_SENSP,
        Register::BIAS_SENSN,
        Register::LOFF_SENSP,
        Register::LOFF_SENSN,
        Register::LOFF_FLIP,
        Register::LOFF_STATP,
        Register::LOFF_STATN,
        Register::GPIO,
        Register::MISC1,
        Register::MISC2,
        Register::CONFIG4,
    ];

    /// Zero-based channel index to its CHnSET register.
    pub const fn from_channel_number(ch: u8) -> Self {
        match ch {
            0 => Self::CH1SET,
            1 => Self::CH2SET,
            2 => Self::CH3SET,
            3 => Self::CH4SET,
            4 => Self::CH5SET,
            5 => Self::CH6SET,
            6 => Self::CH7SET,
            _ => Self::CH8SET,
        }
    }

    pub const fn addr(self) -> u8 {
        self as u8
    }

    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Register::ID | Register::LOFF_STATP | Register::LOFF_STATN
        )
    }

    /// Power-on value from the datasheet. The ID reset value is the
    /// 8-channel part's.
    pub const fn reset_value(self) -> u8 {
        match self {
            Register::ID => 0x3E,
            Register::CONFIG1 => 0x96,
            Register::CONFIG2 => 0xC0,
            Register::CONFIG3 => 0x60,
            Register::CH1SET
            | Register::CH2SET
            | Register::CH3SET
            | Register::CH4SET
            | Register::CH5SET
            | Register::CH6SET
            | Register::CH7SET
            | Register::CH8SET => 0x61,
            Register::GPIO => 0x0F,
            _ => 0x00,
        }
    }
}

impl TryFrom<u8> for Register {
    type Error = ADS1299RegisterError;

    fn try_from(addr: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(addr as usize)
            .copied()
            .ok_or(ADS1299RegisterError::InvalidRegister(addr))
    }
}

/// Host-side mirror of the device register file.
///
/// Only updated by explicit register reads and writes, so it is coherent
/// with the device only while continuous-read mode is off.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    regs: [u8; REGISTER_COUNT],
}

impl Default for RegisterMap {
    fn default() -> Self {
        let mut regs = [0u8; REGISTER_COUNT];
        for reg in Register::ALL {
            regs[reg as usize] = reg.reset_value();
        }
        Self { regs }
    }
}

impl RegisterMap {
    pub fn get(&self, reg: Register) -> u8 {
        self.regs[reg as usize]
    }

    pub fn set(&mut self, reg: Register, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub fn as_bytes(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }
}

/// Family members recognised from the ID register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceVariant {
    Ads1299_4,
    Ads1299_6,
    Ads1299,
}

impl DeviceVariant {
    pub const fn max_channels(self) -> u8 {
        match self {
            DeviceVariant::Ads1299_4 => 4,
            DeviceVariant::Ads1299_6 => 6,
            DeviceVariant::Ads1299 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DeviceVariant::Ads1299_4 => "ADS1299-4",
            DeviceVariant::Ads1299_6 => "ADS1299-6",
            DeviceVariant::Ads1299 => "ADS1299",
        }
    }
}

bitflags! {
    /// ID
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Id: u8 {
        const REV_ID2 = 0b1000_0000;
        const REV_ID1 = 0b0100_0000;
        const REV_ID0 = 0b0010_0000;
        const FIXED   = 0b0001_0000;
        const DEV_ID1 = 0b0000_1000;
        const DEV_ID0 = 0b0000_0100;
        const NU_CH1  = 0b0000_0010;
        const NU_CH0  = 0b0000_0001;

        const REV_ID = Self::REV_ID2.bits() | Self::REV_ID1.bits() | Self::REV_ID0.bits();
        const FAMILY = Self::FIXED.bits() | Self::DEV_ID1.bits() | Self::DEV_ID0.bits()
            | Self::NU_CH1.bits() | Self::NU_CH0.bits();
    }
}

impl Id {
    /// Maps the low five ID bits to a family member.
    pub const fn variant(&self) -> Result<DeviceVariant, ADS1299RegisterError> {
        match self.intersection(Self::FAMILY).bits() {
            0b11100 => Ok(DeviceVariant::Ads1299_4),
            0b11101 => Ok(DeviceVariant::Ads1299_6),
            0b11110 => Ok(DeviceVariant::Ads1299),
            _ => Err(ADS1299RegisterError::AdsNotDetected(self.bits())),
        }
    }

    /// Channel count for the detected variant, zero when unrecognised.
    pub const fn num_chs(&self) -> u8 {
        match self.variant() {
            Ok(variant) => variant.max_channels(),
            Err(_) => 0,
        }
    }
}

bitflags! {
    /// CONFIG1
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Config1: u8 {
        const RESERVED7 = 0b1000_0000;
        const DAISY_EN  = 0b0100_0000;
        const CLK_EN    = 0b0010_0000;
        const RESERVED4 = 0b0001_0000;
        const DR2       = 0b0000_0100;
        const DR1       = 0b0000_0010;
        const DR0       = 0b0000_0001;

        const DR = Self::DR2.bits() | Self::DR1.bits() | Self::DR0.bits();
    }
}

impl Default for Config1 {
    fn default() -> Config1 {
        Self::from_bits_retain(0x96)
    }
}

impl Config1 {
    /// CONFIG1 for the given rate with every other bit at its reset value
    /// except the daisy-chain and clock-output enables.
    pub const fn for_rate(rate: SampleRate) -> Self {
        Self::RESERVED7.union(Self::RESERVED4).with_odr(rate)
    }

    pub const fn odr(&self) -> Result<SampleRate, ADS1299RegisterError> {
        let code = self.intersection(Self::DR).bits();
        match code {
            0b000..=0b110 => Ok(SampleRate::ALL[(6 - code) as usize]),
            e => Err(ADS1299RegisterError::InvalidSamplingRate(e)),
        }
    }

    pub const fn with_odr(self, sample_rate: SampleRate) -> Self {
        self.difference(Self::DR)
            .union(Self::from_bits_retain(sample_rate.code()))
    }
}

bitflags! {
    /// CONFIG3
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Config3: u8 {
        const PD_REFBUF      = 0b1000_0000;
        const RESERVED       = 0b0110_0000;
        const BIAS_MEAS      = 0b0001_0000;
        const BIASREF_INT    = 0b0000_1000;
        const PD_BIAS        = 0b0000_0100;
        const BIAS_LOFF_SENS = 0b0000_0010;
        const BIAS_STAT      = 0b0000_0001;
    }
}

impl Default for Config3 {
    fn default() -> Self {
        Self::from_bits_retain(0x60)
    }
}

impl Config3 {
    /// Internal reference buffer and bias drive powered, bias reference
    /// generated internally.
    pub const fn powered() -> Self {
        Self::RESERVED
            .union(Self::PD_REFBUF)
            .union(Self::BIASREF_INT)
            .union(Self::PD_BIAS)
    }

    /// Set the power-down state of the reference buffer
    pub const fn with_pd_refbuf(self, pd_refbuf: bool) -> Self {
        let reg = self.difference(Self::PD_REFBUF);
        match pd_refbuf {
            false => reg,
            true => reg.union(Self::PD_REFBUF),
        }
    }
}

bitflags! {
    /// LOFF
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Loff: u8 {
        const COMP_TH2   = 0b1000_0000;
        const COMP_TH1   = 0b0100_0000;
        const COMP_TH0   = 0b0010_0000;
        const ILEAD_OFF1 = 0b0000_1000;
        const ILEAD_OFF0 = 0b0000_0100;
        const FLEAD_OFF1 = 0b0000_0010;
        const FLEAD_OFF0 = 0b0000_0001;

        const COMP_TH = Self::COMP_TH2.bits() | Self::COMP_TH1.bits() | Self::COMP_TH0.bits();
        const ILEAD_OFF = Self::ILEAD_OFF1.bits() | Self::ILEAD_OFF0.bits();
        const FLEAD_OFF = Self::FLEAD_OFF1.bits() | Self::FLEAD_OFF0.bits();
    }
}

impl Default for Loff {
    fn default() -> Self {
        Self::empty()
    }
}

impl Loff {
    pub const fn ilead_off(&self) -> ILeadOff {
        match self.intersection(Self::ILEAD_OFF).bits() >> 2 {
            0b00 => ILeadOff::_6nA,
            0b01 => ILeadOff::_24nA,
            0b10 => ILeadOff::_6uA,
            _ => ILeadOff::_24uA,
        }
    }

    pub const fn with_ilead_off(self, ilead_off: ILeadOff) -> Self {
        self.difference(Self::ILEAD_OFF)
            .union(Self::from_bits_retain((ilead_off as u8) << 2))
    }

    pub const fn flead_off(&self) -> FLeadOff {
        match self.intersection(Self::FLEAD_OFF).bits() {
            0b00 => FLeadOff::Dc,
            0b01 => FLeadOff::Ac7_8,
            0b10 => FLeadOff::Ac31_2,
            _ => FLeadOff::AcFdrBy4,
        }
    }

    pub const fn with_flead_off(self, flead_off: FLeadOff) -> Self {
        self.difference(Self::FLEAD_OFF)
            .union(Self::from_bits_retain(flead_off as u8))
    }
}

bitflags! {
    /// CHnSET
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ChSet: u8 {
        const PD    = 0b1000_0000;
        const GAIN2 = 0b0100_0000;
        const GAIN1 = 0b0010_0000;
        const GAIN0 = 0b0001_0000;
        const SRB2  = 0b0000_1000;
        const MUX2  = 0b0000_0100;
        const MUX1  = 0b0000_0010;
        const MUX0  = 0b0000_0001;

        const GAIN = Self::GAIN2.bits() | Self::GAIN1.bits() | Self::GAIN0.bits();
        const MUX = Self::MUX2.bits() | Self::MUX1.bits() | Self::MUX0.bits();
    }
}

impl Default for ChSet {
    fn default() -> Self {
        Self::from_bits_retain(0x61)
    }
}

impl ChSet {
    /// Powered channel, normal input, SRB2 open, with the raw 3-bit gain
    /// field. Code 7 is reserved by the device and is passed through.
    pub const fn from_gain_code(code: u8) -> Self {
        Self::from_bits_retain((code & 0b111) << 4)
    }

    pub const fn pd(&self) -> bool {
        self.contains(Self::PD)
    }

    pub const fn mux(&self) -> Mux {
        Mux::from_code(self.intersection(Self::MUX).bits())
    }

    pub const fn with_mux(self, mux: Mux) -> Self {
        self.difference(Self::MUX)
            .union(Self::from_bits_retain(mux as u8))
    }

    pub const fn gain_code(&self) -> u8 {
        self.intersection(Self::GAIN).bits() >> 4
    }

    pub const fn with_gain(self, gain: Gain) -> Self {
        self.difference(Self::GAIN)
            .union(Self::from_bits_retain(gain.code() << 4))
    }
}

bitflags! {
    /// One bit per channel, bit 0 is channel 1. Shared layout of the
    /// LOFF_SENSP/N, BIAS_SENSP/N and LOFF_STATP/N registers.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
    pub struct ChannelMask: u8 {
        const CH1 = 0b0000_0001;
        const CH2 = 0b0000_0010;
        const CH3 = 0b0000_0100;
        const CH4 = 0b0000_1000;
        const CH5 = 0b0001_0000;
        const CH6 = 0b0010_0000;
        const CH7 = 0b0100_0000;
        const CH8 = 0b1000_0000;
    }
}

impl ChannelMask {
    /// Mask covering the first `n` channels.
    pub const fn first(n: u8) -> Self {
        if n >= 8 {
            Self::all()
        } else {
            Self::from_bits_retain((1u8 << n) - 1)
        }
    }

    pub const fn with_channel(self, ch: u8) -> Self {
        if ch < 8 {
            self.union(Self::from_bits_retain(1 << ch))
        } else {
            self
        }
    }

    pub const fn count(&self) -> u8 {
        self.bits().count_ones() as u8
    }
}

bitflags! {
    /// GPIO
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Gpio: u8 {
        const GPIOD4 = 0b1000_0000;
        const GPIOD3 = 0b0100_0000;
        const GPIOD2 = 0b0010_0000;
        const GPIOD1 = 0b0001_0000;
        const GPIOC4 = 0b0000_1000;
        const GPIOC3 = 0b0000_0100;
        const GPIOC2 = 0b0000_0010;
        const GPIOC1 = 0b0000_0001;
    }
}

impl Default for Gpio {
    fn default() -> Self {
        Self::from_bits_retain(0x0F)
    }
}

impl Gpio {
    /// GPIO4 as an output driven high.
    pub const fn with_led_on(self) -> Self {
        self.difference(Self::GPIOC4).union(Self::GPIOD4)
    }

    /// GPIO4 driven low.
    pub const fn with_led_off(self) -> Self {
        self.difference(Self::GPIOC4).difference(Self::GPIOD4)
    }
}

bitflags! {
    /// CONFIG4
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Config4: u8 {
        const SINGLE_SHOT  = 0b0000_1000;
        const PD_LOFF_COMP = 0b0000_0010;
    }
}

impl Default for Config4 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Config4 {
    /// Setting PD_LOFF_COMP powers the lead-off comparators up.
    pub const fn with_loff_comparators(self, enabled: bool) -> Self {
        let reg = self.difference(Self::PD_LOFF_COMP);
        match enabled {
            false => reg,
            true => reg.union(Self::PD_LOFF_COMP),
        }
    }
}
