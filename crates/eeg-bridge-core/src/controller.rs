use crate::{AdsCell, BridgeContext, Clock, Error, MutexType, SessionState};
use ads1299::{
    Ads1299, ChSet, ChannelMask, Command, Config3, DeviceVariant, FLeadOff,
    Gain, Gpio, ILeadOff, Loff, Register, SampleRate,
};
use eeg_bridge_icd::{
    block_count, ControlCommand, StatusReport, TextCommand, TextReply,
    DRIVER_VERSION,
};
use embassy_sync::mutex::MutexGuard;
use embedded_hal_async::spi::SpiDevice;

/// Identity strings reported by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardInfo {
    pub board_name: &'static str,
    pub maker_name: &'static str,
}

/// Exclusive register access with streaming stopped.
///
/// Obtained from [`Controller::configure`]. Consume it with
/// [`Configuring::start_streaming`] or [`Configuring::finish`]; dropping it
/// leaves the session idle.
pub struct Configuring<'a, SPI> {
    ads: MutexGuard<'a, MutexType, Ads1299<SPI>>,
    ctx: &'a BridgeContext,
}

impl<SPI, E> Configuring<'_, SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn device(&mut self) -> &mut Ads1299<SPI> {
        &mut self.ads
    }

    /// START, then RDATAC. Capture resumes on the next data-ready edge.
    pub async fn start_streaming(mut self) -> Result<(), Error<E>> {
        self.ads.start().await?;
        self.ads.enter_continuous_read().await?;
        self.ctx.set_state(SessionState::Streaming);
        Ok(())
    }

    pub fn finish(self) {
        self.ctx.set_state(SessionState::Idle);
    }

    async fn resume(self, streaming: bool) -> Result<(), Error<E>> {
        if streaming {
            self.start_streaming().await
        } else {
            self.finish();
            Ok(())
        }
    }
}

impl<SPI> Drop for Configuring<'_, SPI> {
    fn drop(&mut self) {
        if self.ctx.state() == SessionState::Configuring {
            self.ctx.set_state(SessionState::Idle);
        }
    }
}

/// Applies control and text commands to the device.
///
/// The only writer of the session state. Commands are expected one at a
/// time; the `&mut self` receivers make that hold for a single owner.
pub struct Controller<'a, SPI, C> {
    ads: &'a AdsCell<SPI>,
    ctx: &'a BridgeContext,
    clock: C,
    board: BoardInfo,
    rate: SampleRate,
    low_latency: bool,
    active: ChannelMask,
}

impl<'a, SPI, E, C> Controller<'a, SPI, C>
where
    SPI: SpiDevice<Error = E>,
    C: Clock,
{
    pub fn new(
        ads: &'a AdsCell<SPI>,
        ctx: &'a BridgeContext,
        clock: C,
        board: BoardInfo,
    ) -> Self {
        Self {
            ads,
            ctx,
            clock,
            board,
            rate: SampleRate::Sps250,
            low_latency: false,
            active: ChannelMask::empty(),
        }
    }

    /// Rate programmed by [`Self::boot`].
    pub fn with_default_rate(mut self, rate: SampleRate, low_latency: bool) -> Self {
        self.rate = rate;
        self.low_latency = low_latency;
        self
    }

    pub fn sample_rate(&self) -> (SampleRate, bool) {
        (self.rate, self.low_latency)
    }

    /// Channels seen active at the last check.
    pub fn active_channels(&self) -> ChannelMask {
        self.active
    }

    /// Stops streaming and takes the device.
    ///
    /// Streaming is cleared before the device lock is taken, so the capture
    /// stage stops reading frames first.
    pub async fn configure(&mut self) -> Result<Configuring<'_, SPI>, Error<E>> {
        let was_streaming = self.ctx.is_streaming();
        self.ctx.set_state(SessionState::Configuring);
        let mut token = Configuring { ads: self.ads.lock().await, ctx: self.ctx };
        token.ads.exit_continuous_read().await?;
        if was_streaming {
            token.ads.stop().await?;
        }
        Ok(token)
    }

    /// Reset, identify and load the default register set. Leaves the
    /// session idle.
    pub async fn boot(&mut self) -> Result<(DeviceVariant, u8), Error<E>> {
        let ctx = self.ctx;
        let rate = self.rate;
        let blocks = block_count(self.rate, self.low_latency);

        let mut cfg = self.configure().await?;
        let ads = cfg.device();
        ads.reset().await?;
        let (variant, channels) = match ads.detect_device().await {
            Ok(found) => found,
            Err(e) => {
                ctx.set_device(None);
                error!("ADS1299 not detected");
                return Err(e.into());
            }
        };
        ctx.set_device(Some(variant));

        ads.set_sampling_rate(rate).await?;
        ads.write_register(Register::CONFIG2, Register::CONFIG2.reset_value())
            .await?;
        ads.write_register(Register::CONFIG3, Config3::powered().bits())
            .await?;
        ads.write_register(Register::MISC1, 0x00).await?;
        ads.write_register(Register::GPIO, 0x00).await?;
        ads.set_all_channels(ChSet::from_gain_code(Gain::X24.code())).await?;
        ctx.set_blocks_per_packet(blocks);
        cfg.finish();

        self.active = ChannelMask::first(channels);
        info!("{} detected, {} channels", variant.name(), channels);
        Ok((variant, channels))
    }

    pub async fn handle_control(
        &mut self,
        command: ControlCommand,
    ) -> Result<(), Error<E>> {
        info!("control {:?}", command);
        match command {
            ControlCommand::SetSampleRate { rate, low_latency } => {
                self.set_sample_rate(rate, low_latency).await
            }
            ControlCommand::SetGain(code) => self.set_gain(code).await,
            ControlCommand::ImpedanceCheck => self.impedance_check().await,
        }
    }

    /// Programs the rate and (re)starts streaming with the matching block
    /// count.
    pub async fn set_sample_rate(
        &mut self,
        rate: SampleRate,
        low_latency: bool,
    ) -> Result<(), Error<E>> {
        self.require_device()?;
        if !self.ctx.client_attached() {
            return Err(Error::NoClient);
        }
        let ctx = self.ctx;
        let blocks = block_count(rate, low_latency);

        let mut cfg = self.configure().await?;
        cfg.device().set_sampling_rate(rate).await?;
        ctx.set_blocks_per_packet(blocks);
        cfg.start_streaming().await?;

        self.rate = rate;
        self.low_latency = low_latency;
        info!("streaming {} SPS, {} blocks per packet", rate.hz(), blocks);
        Ok(())
    }

    /// Same gain on every channel, normal electrode input.
    pub async fn set_gain(&mut self, code: u8) -> Result<(), Error<E>> {
        self.require_device()?;
        let resume = self.ctx.is_streaming();
        let channels = self.ctx.channels();

        let mut cfg = self.configure().await?;
        cfg.device()
            .set_all_channels(ChSet::from_gain_code(code))
            .await?;
        cfg.resume(resume).await?;

        self.active = ChannelMask::first(channels);
        Ok(())
    }

    /// AC lead-off excitation on every channel. The sampling rate is left
    /// alone.
    pub async fn impedance_check(&mut self) -> Result<(), Error<E>> {
        self.require_device()?;
        let resume = self.ctx.is_streaming();
        let loff = Loff::default()
            .with_ilead_off(ILeadOff::_6nA)
            .with_flead_off(FLeadOff::Ac31_2);

        let mut cfg = self.configure().await?;
        cfg.device().enable_lead_off(loff).await?;
        cfg.resume(resume).await
    }

    /// RDATAC: streams if at least one channel is not shorted.
    pub async fn start_streaming(&mut self) -> Result<(), Error<E>> {
        self.require_device()?;
        if !self.ctx.client_attached() {
            return Err(Error::NoClient);
        }

        let mut cfg = self.configure().await?;
        let active = cfg.device().detect_active_channels().await?;
        let started = if active.is_empty() {
            cfg.finish();
            Err(Error::NoActiveChannels)
        } else {
            cfg.start_streaming().await
        };
        self.active = active;
        started
    }

    /// SDATAC: back to idle.
    pub async fn stop_streaming(&mut self) -> Result<(), Error<E>> {
        let cfg = self.configure().await?;
        cfg.finish();
        Ok(())
    }

    /// A client connected. Data queued for an earlier client is dropped by
    /// the streamer; the packet counter carries on.
    pub fn on_connect(&mut self) {
        self.ctx.attach();
        info!("client attached");
    }

    /// Client went away: stop conversions and go idle.
    pub async fn on_disconnect(&mut self) -> Result<(), Error<E>> {
        self.ctx.detach();
        info!("client detached");
        if self.ctx.is_streaming() {
            self.stop_streaming().await?;
            info!("streaming stopped");
        }
        Ok(())
    }

    pub async fn handle_text(&mut self, command: TextCommand) -> TextReply<'static> {
        debug!("text {:?}", command);
        match self.run_text(command).await {
            Ok(reply) => reply,
            Err(Error::NoActiveChannels) => TextReply::NoActiveChannels,
            Err(e) => {
                warn!("{:?} failed: {}", command, e.as_str());
                TextReply::Error
            }
        }
    }

    async fn run_text(
        &mut self,
        command: TextCommand,
    ) -> Result<TextReply<'static>, Error<E>> {
        let reply = match command {
            TextCommand::Nop => TextReply::Ok,
            TextCommand::Micros => TextReply::Number(self.clock.now_micros()),
            TextCommand::Version => TextReply::Version(DRIVER_VERSION),
            TextCommand::Status => TextReply::Status(self.status().await?),
            TextCommand::SerialNumber
            | TextCommand::LedOn
            | TextCommand::LedOff => TextReply::NotImplemented,
            TextCommand::BoardLedOn => {
                self.modify_gpio(Gpio::with_led_on).await?;
                TextReply::Ok
            }
            TextCommand::BoardLedOff => {
                self.modify_gpio(Gpio::with_led_off).await?;
                TextReply::Ok
            }
            TextCommand::Wakeup => {
                self.send_opcode(Command::WAKEUP).await?;
                TextReply::Ok
            }
            TextCommand::Standby => {
                self.send_opcode(Command::STANDBY).await?;
                TextReply::Ok
            }
            TextCommand::Reset => {
                self.boot().await?;
                TextReply::Ok
            }
            TextCommand::Start => {
                self.send_opcode(Command::START).await?;
                self.ctx.request_sequence_reset();
                TextReply::Ok
            }
            TextCommand::Stop => {
                self.send_opcode(Command::STOP).await?;
                TextReply::Ok
            }
            TextCommand::Rdatac => {
                self.start_streaming().await?;
                TextReply::Ok
            }
            TextCommand::Sdatac => {
                self.stop_streaming().await?;
                TextReply::Ok
            }
            TextCommand::Rreg { register } => {
                let reg = Register::try_from(register)?;
                TextReply::Number(self.read_register(reg).await?.into())
            }
            TextCommand::Wreg { register, value } => {
                let reg = Register::try_from(register)?;
                self.write_register(reg, value).await?;
                TextReply::Ok
            }
            TextCommand::Help => TextReply::Help,
            TextCommand::Unknown => TextReply::Error,
        };
        Ok(reply)
    }

    /// Reads one register with streaming paused.
    pub async fn read_register(&mut self, reg: Register) -> Result<u8, Error<E>> {
        let resume = self.ctx.is_streaming();
        let mut cfg = self.configure().await?;
        let value = cfg.device().read_register(reg).await;
        cfg.resume(resume).await?;
        Ok(value?)
    }

    /// Writes one register with streaming paused. Read-only targets are
    /// rejected before the session is touched.
    pub async fn write_register(
        &mut self,
        reg: Register,
        value: u8,
    ) -> Result<(), Error<E>> {
        if reg.is_read_only() {
            return Err(ads1299::ADS1299RegisterError::ReadOnlyRegister(
                reg.addr(),
            )
            .into());
        }
        let resume = self.ctx.is_streaming();
        let mut cfg = self.configure().await?;
        let written = cfg.device().write_register(reg, value).await;
        cfg.resume(resume).await?;
        Ok(written?)
    }

    async fn modify_gpio(&mut self, f: fn(Gpio) -> Gpio) -> Result<(), Error<E>> {
        let resume = self.ctx.is_streaming();
        let mut cfg = self.configure().await?;
        let modified = cfg
            .device()
            .modify_register(Register::GPIO, |v| f(Gpio::from_bits_retain(v)).bits())
            .await;
        cfg.resume(resume).await?;
        Ok(modified?)
    }

    async fn status(&mut self) -> Result<StatusReport<'static>, Error<E>> {
        let variant = self.ctx.device();
        if variant.is_some() {
            let resume = self.ctx.is_streaming();
            let mut cfg = self.configure().await?;
            let active = cfg.device().detect_active_channels().await;
            cfg.resume(resume).await?;
            self.active = active?;
        }
        Ok(StatusReport {
            driver_version: DRIVER_VERSION,
            board_name: self.board.board_name,
            maker_name: self.board.maker_name,
            hardware_type: variant.map_or("unknown", DeviceVariant::name),
            max_channels: variant.map_or(0, DeviceVariant::max_channels),
            active_channels: self.active.count(),
        })
    }

    /// Bare opcode. Does not touch registers, so streaming is left as is.
    async fn send_opcode(&mut self, command: Command) -> Result<(), Error<E>> {
        let mut ads = self.ads.lock().await;
        ads.send_opcode(command).await?;
        Ok(())
    }

    fn require_device(&self) -> Result<(), Error<E>> {
        if self.ctx.channels() == 0 {
            return Err(Error::DeviceAbsent);
        }
        Ok(())
    }
}
