#![no_std]

use byteorder::{BigEndian, ByteOrder};
use embedded_hal::spi::Operation;
use embedded_hal_async::spi::SpiDevice;

pub use crate::errors::{ADS1299RegisterError, Error};
pub use crate::registers::*;
use core::result::Result;

pub mod errors;
pub mod registers;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

/// Master clock period at 2.048 MHz, rounded up.
pub const T_CLK_NS: u32 = 489;
// Clock calculations
pub const MIN_T_POR: u32 = T_CLK_NS << 18;
pub const MIN_T_RST: u32 = T_CLK_NS << 1;
pub const MIN_RST_WAIT: u32 = 18 * T_CLK_NS;
/// CS low to first SCLK.
pub const T_CSSC_NS: u32 = T_CLK_NS;
/// Opcode decode time before the next byte or CS release.
pub const T_DECODE_NS: u32 = 4 * T_CLK_NS;

pub const STATUS_LEN: usize = 3;
pub const BYTES_PER_CHANNEL: usize = 3;
pub const MAX_FRAME_LEN: usize = STATUS_LEN + BYTES_PER_CHANNEL * MAX_CHANNELS;

/// Driver for a single ADS1299 on an SPI device.
///
/// Every transaction asserts CS, waits `T_CSSC_NS`, and holds CS for the
/// decode time after the last byte. Multi-byte register opcodes are also
/// separated by the decode time. The driver does not track continuous-read
/// mode; callers must leave it before touching registers.
pub struct Ads1299<SPI> {
    spi: SPI,
    map: RegisterMap,
    num_chs: u8,
}

impl<E, SPI> Ads1299<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi, map: RegisterMap::default(), num_chs: 0 }
    }

    /// Channel count from the last successful [`Self::detect_device`],
    /// zero before detection or after a failed one.
    pub fn num_chs(&self) -> u8 {
        self.num_chs
    }

    /// Last known register contents.
    pub fn registers(&self) -> &RegisterMap {
        &self.map
    }

    pub fn spi(&self) -> &SPI {
        &self.spi
    }

    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Sends a single-byte opcode.
    pub async fn send_opcode(
        &mut self,
        command: Command,
    ) -> Result<(), Error<E>> {
        let (bytes, _): ([u8; 2], usize) = command.into();
        let settle = match command {
            Command::RESET => MIN_RST_WAIT,
            _ => T_DECODE_NS,
        };
        self.spi
            .transaction(&mut [
                Operation::DelayNs(T_CSSC_NS),
                Operation::Write(&bytes[..1]),
                Operation::DelayNs(settle),
            ])
            .await
            .map_err(Error::SpiError)
    }

    /// Issues RESET and leaves the device out of continuous-read mode,
    /// which it enters by default after a reset.
    pub async fn reset(&mut self) -> Result<(), Error<E>> {
        self.send_opcode(Command::RESET).await?;
        self.map = RegisterMap::default();
        self.exit_continuous_read().await
    }

    pub async fn wakeup(&mut self) -> Result<(), Error<E>> {
        self.send_opcode(Command::WAKEUP).await
    }

    pub async fn standby(&mut self) -> Result<(), Error<E>> {
        self.send_opcode(Command::STANDBY).await
    }

    pub async fn start(&mut self) -> Result<(), Error<E>> {
        self.send_opcode(Command::START).await
    }

    pub async fn stop(&mut self) -> Result<(), Error<E>> {
        self.send_opcode(Command::STOP).await
    }

    pub async fn enter_continuous_read(&mut self) -> Result<(), Error<E>> {
        self.send_opcode(Command::RDATAC).await
    }

    pub async fn exit_continuous_read(&mut self) -> Result<(), Error<E>> {
        self.send_opcode(Command::SDATAC).await
    }

    pub async fn read_register(
        &mut self,
        reg: Register,
    ) -> Result<u8, Error<E>> {
        let (op, _): ([u8; 2], usize) = Command::RREG(reg, 1).into();
        let mut value = [0u8];

        self.spi
            .transaction(&mut [
                Operation::DelayNs(T_CSSC_NS),
                Operation::Write(&op[..1]),
                Operation::DelayNs(T_DECODE_NS),
                Operation::Write(&op[1..]),
                Operation::DelayNs(T_DECODE_NS),
                Operation::Read(&mut value),
                Operation::DelayNs(T_DECODE_NS),
            ])
            .await
            .map_err(Error::SpiError)?;

        self.map.set(reg, value[0]);
        Ok(value[0])
    }

    pub async fn write_register(
        &mut self,
        reg: Register,
        val: u8,
    ) -> Result<(), Error<E>> {
        if reg.is_read_only() {
            return Err(ADS1299RegisterError::ReadOnlyRegister(reg.addr()).into());
        }
        let (op, _): ([u8; 2], usize) = Command::WREG(reg, 1).into();
        let payload = [val];

        self.spi
            .transaction(&mut [
                Operation::DelayNs(T_CSSC_NS),
                Operation::Write(&op[..1]),
                Operation::DelayNs(T_DECODE_NS),
                Operation::Write(&op[1..]),
                Operation::DelayNs(T_DECODE_NS),
                Operation::Write(&payload),
                Operation::DelayNs(T_DECODE_NS),
            ])
            .await
            .map_err(Error::SpiError)?;

        self.map.set(reg, val);
        Ok(())
    }

    pub async fn modify_register<F>(
        &mut self,
        register: Register,
        f: F,
    ) -> Result<(), Error<E>>
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read_register(register).await?;

        self.write_register(register, f(value)).await
    }

    /// Reads the ID register and records the channel count. An unknown ID
    /// leaves the channel count at zero.
    pub async fn detect_device(
        &mut self,
    ) -> Result<(DeviceVariant, u8), Error<E>> {
        let id = Id::from_bits_retain(self.read_register(Register::ID).await?);
        match id.variant() {
            Ok(variant) => {
                self.num_chs = variant.max_channels();
                Ok((variant, self.num_chs))
            }
            Err(e) => {
                self.num_chs = 0;
                Err(e.into())
            }
        }
    }

    /// A channel counts as active unless its input mux is shorted.
    pub async fn detect_active_channels(
        &mut self,
    ) -> Result<ChannelMask, Error<E>> {
        let mut active = ChannelMask::empty();
        for ch in 0..self.num_chs {
            let reg = Register::from_channel_number(ch);
            let chset = ChSet::from_bits_retain(self.read_register(reg).await?);
            if chset.mux() != Mux::InputShorted {
                active = active.with_channel(ch);
            }
        }
        Ok(active)
    }

    pub async fn get_sampling_rate(&mut self) -> Result<SampleRate, Error<E>> {
        let reg_value: u8 = self.read_register(Register::CONFIG1).await?;
        let config1 = Config1::from_bits_retain(reg_value);

        config1.odr().map_err(Error::from)
    }

    pub async fn set_sampling_rate(
        &mut self,
        sample_rate: SampleRate,
    ) -> Result<(), Error<E>> {
        self.write_register(
            Register::CONFIG1,
            Config1::for_rate(sample_rate).bits(),
        )
        .await
    }

    pub async fn set_channel(
        &mut self,
        ch: u8,
        chset: ChSet,
    ) -> Result<(), Error<E>> {
        self.write_register(Register::from_channel_number(ch), chset.bits())
            .await
    }

    /// Writes the same channel settings to every present channel.
    pub async fn set_all_channels(
        &mut self,
        chset: ChSet,
    ) -> Result<(), Error<E>> {
        for ch in 0..self.num_chs {
            self.set_channel(ch, chset).await?;
        }
        Ok(())
    }

    /// Lead-off sensing on every present channel, both polarities.
    pub async fn enable_lead_off(&mut self, loff: Loff) -> Result<(), Error<E>> {
        let mask = ChannelMask::first(self.num_chs).bits();
        self.write_register(Register::LOFF, loff.bits()).await?;
        self.write_register(Register::LOFF_SENSP, mask).await?;
        self.write_register(Register::LOFF_SENSN, mask).await?;
        self.modify_register(Register::CONFIG4, |v| {
            Config4::from_bits_retain(v).with_loff_comparators(true).bits()
        })
        .await
    }

    /// Clocks out one status word plus one sample per present channel.
    ///
    /// In continuous-read mode this is the whole transaction, so it takes a
    /// fixed number of bus cycles and never retries.
    pub async fn read_frame(&mut self) -> Result<Frame, Error<E>> {
        let chs = self.num_chs;
        if chs == 0 {
            return Err(ADS1299RegisterError::InvalidChannelCount(chs).into());
        }
        let mut bytes = [0u8; MAX_FRAME_LEN];
        let len = Frame::len_for(chs);

        self.spi
            .transaction(&mut [
                Operation::DelayNs(T_CSSC_NS),
                Operation::Read(&mut bytes[..len]),
                Operation::DelayNs(T_DECODE_NS),
            ])
            .await
            .map_err(Error::SpiError)?;

        Ok(Frame::new(bytes, chs))
    }
}

/// Raw bytes of one conversion: 24-bit status word followed by one 24-bit
/// big-endian sample per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    bytes: [u8; MAX_FRAME_LEN],
    channels: u8,
}

impl Frame {
    pub const fn len_for(channels: u8) -> usize {
        STATUS_LEN + BYTES_PER_CHANNEL * channels as usize
    }

    pub fn new(bytes: [u8; MAX_FRAME_LEN], channels: u8) -> Self {
        Self { bytes, channels: channels.min(MAX_CHANNELS as u8) }
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn len(&self) -> usize {
        Self::len_for(self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.channels == 0
    }

    /// Status word and channel data as read from the bus.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn status(&self) -> &[u8] {
        &self.bytes[..STATUS_LEN]
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes[STATUS_LEN..self.len()]
    }

    /// The status word always starts with 0b1100.
    pub fn is_synced(&self) -> bool {
        self.bytes[0] & 0xF0 == 0xC0
    }

    pub fn lead_off_pos(&self) -> ChannelMask {
        ChannelMask::from_bits_retain(self.bytes[0] << 4 | self.bytes[1] >> 4)
    }

    pub fn lead_off_neg(&self) -> ChannelMask {
        ChannelMask::from_bits_retain(self.bytes[1] << 4 | self.bytes[2] >> 4)
    }

    pub fn gpio(&self) -> u8 {
        self.bytes[2] & 0x0F
    }

    /// Signed sample of channel `ch`, zero-based.
    pub fn sample(&self, ch: u8) -> Option<i32> {
        if ch >= self.channels {
            return None;
        }
        let start = STATUS_LEN + BYTES_PER_CHANNEL * ch as usize;
        Some(BigEndian::read_i24(&self.bytes[start..start + BYTES_PER_CHANNEL]))
    }
}

#[cfg(test)]
mod tests {
    use super::sim::SimAds;
    use super::*;

    fn ads() -> Ads1299<SimAds> {
        Ads1299::new(SimAds::new(0x3E))
    }

    #[futures_test::test]
    async fn reset_leaves_continuous_read() {
        let mut ads = ads();
        ads.reset().await.unwrap();
        assert!(!ads.spi().is_continuous());
        assert_eq!(ads.spi().opcodes(), &[0x06, 0x11]);
        assert_eq!(ads.spi().violations(), 0);
    }

    #[futures_test::test]
    async fn register_round_trip() {
        let mut ads = ads();
        ads.reset().await.unwrap();
        for addr in 1..REGISTER_COUNT as u8 {
            let reg = Register::try_from(addr).unwrap();
            if reg.is_read_only() {
                continue;
            }
            let value = addr.wrapping_mul(37) ^ 0x5A;
            ads.write_register(reg, value).await.unwrap();
            assert_eq!(ads.read_register(reg).await.unwrap(), value);
            assert_eq!(ads.registers().get(reg), value);
        }
        assert_eq!(ads.spi().violations(), 0);
    }

    #[futures_test::test]
    async fn read_only_registers_are_rejected() {
        let mut ads = ads();
        let err = ads.write_register(Register::ID, 0).await.unwrap_err();
        assert_eq!(
            err,
            Error::RegisterError(ADS1299RegisterError::ReadOnlyRegister(0))
        );
        assert!(ads.spi().opcodes().is_empty());
    }

    #[futures_test::test]
    async fn detects_each_variant() {
        for (id, variant, chs) in [
            (0x3C, DeviceVariant::Ads1299_4, 4),
            (0x3D, DeviceVariant::Ads1299_6, 6),
            (0x3E, DeviceVariant::Ads1299, 8),
        ] {
            let mut ads = Ads1299::new(SimAds::new(id));
            ads.reset().await.unwrap();
            assert_eq!(ads.detect_device().await.unwrap(), (variant, chs));
            assert_eq!(ads.num_chs(), chs);
        }
    }

    #[futures_test::test]
    async fn unknown_id_zeroes_channel_count() {
        let mut ads = Ads1299::new(SimAds::new(0xFF));
        ads.reset().await.unwrap();
        let err = ads.detect_device().await.unwrap_err();
        assert_eq!(
            err,
            Error::RegisterError(ADS1299RegisterError::AdsNotDetected(0xFF))
        );
        assert_eq!(ads.num_chs(), 0);
        assert!(ads.read_frame().await.is_err());
    }

    #[futures_test::test]
    async fn shorted_channels_are_inactive() {
        let mut ads = ads();
        ads.reset().await.unwrap();
        ads.detect_device().await.unwrap();
        // Power-on CHnSET is shorted input.
        assert_eq!(ads.detect_active_channels().await.unwrap(), ChannelMask::empty());

        ads.set_channel(0, ChSet::from_gain_code(6)).await.unwrap();
        ads.set_channel(5, ChSet::default().with_mux(Mux::TestSignal))
            .await
            .unwrap();
        let active = ads.detect_active_channels().await.unwrap();
        assert_eq!(active, ChannelMask::CH1 | ChannelMask::CH6);
    }

    #[futures_test::test]
    async fn frame_read_in_continuous_mode() {
        let mut ads = Ads1299::new(SimAds::new(0x3C));
        ads.reset().await.unwrap();
        ads.detect_device().await.unwrap();
        ads.start().await.unwrap();
        ads.enter_continuous_read().await.unwrap();

        let mut raw = [0u8; MAX_FRAME_LEN];
        raw[..6].copy_from_slice(&[0xC0, 0x10, 0x05, 0xFF, 0xFF, 0xFE]);
        raw[6..9].copy_from_slice(&[0x00, 0x00, 0x7B]);
        ads.spi_mut().push_frame(raw);

        let frame = ads.read_frame().await.unwrap();
        assert_eq!(frame.len(), 15);
        assert_eq!(frame.as_bytes(), &raw[..15]);
        assert!(frame.is_synced());
        assert_eq!(frame.lead_off_pos(), ChannelMask::CH1);
        assert_eq!(frame.gpio(), 0x05);
        assert_eq!(frame.sample(0), Some(-2));
        assert_eq!(frame.sample(1), Some(123));
        assert_eq!(frame.sample(4), None);
        assert_eq!(ads.spi().violations(), 0);
    }

    #[futures_test::test]
    async fn lead_off_covers_present_channels() {
        let mut ads = Ads1299::new(SimAds::new(0x3D));
        ads.reset().await.unwrap();
        ads.detect_device().await.unwrap();
        let loff = Loff::default().with_flead_off(FLeadOff::Ac31_2);
        ads.enable_lead_off(loff).await.unwrap();

        let sim = ads.spi();
        assert_eq!(sim.register(Register::LOFF), 0x02);
        assert_eq!(sim.register(Register::LOFF_SENSP), 0x3F);
        assert_eq!(sim.register(Register::LOFF_SENSN), 0x3F);
        assert_eq!(sim.register(Register::CONFIG4), 0x02);
    }
}
