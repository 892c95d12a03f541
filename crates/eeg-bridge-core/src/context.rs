use crate::MutexType;
use ads1299::DeviceVariant;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};

/// Where the acquisition session is. Only the controller moves it.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    Idle = 0,
    /// Streaming is stopped and the controller owns the device registers.
    Configuring = 1,
    Streaming = 2,
}

impl SessionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Configuring,
            2 => SessionState::Streaming,
            _ => SessionState::Idle,
        }
    }
}

/// Counters bumped from the capture stage. Never reset.
#[derive(Default)]
pub struct CaptureStats {
    overflows: AtomicU32,
    bus_errors: AtomicU32,
    busy_skips: AtomicU32,
    captured: AtomicU32,
    packets_sent: AtomicU32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsSnapshot {
    pub overflows: u32,
    pub bus_errors: u32,
    pub busy_skips: u32,
    pub captured: u32,
    pub packets_sent: u32,
}

impl CaptureStats {
    pub const fn new() -> Self {
        Self {
            overflows: AtomicU32::new(0),
            bus_errors: AtomicU32::new(0),
            busy_skips: AtomicU32::new(0),
            captured: AtomicU32::new(0),
            packets_sent: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_overflow(&self) {
        self.overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bus_error(&self) {
        self.bus_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_busy_skip(&self) {
        self.busy_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_captured(&self) {
        self.captured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_packet_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            overflows: self.overflows.load(Ordering::Relaxed),
            bus_errors: self.bus_errors.load(Ordering::Relaxed),
            busy_skips: self.busy_skips.load(Ordering::Relaxed),
            captured: self.captured.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the capture stage, the streamer and the
/// controller. Lives in a `static`; every field is an atomic or a signal so
/// the interrupt-priority side never blocks on it.
pub struct BridgeContext {
    state: AtomicU8,
    client_attached: AtomicBool,
    /// Bumped on every attach so the streamer can tell a new client apart.
    attach_epoch: AtomicU32,
    /// Channel count of the detected device, zero if none.
    channels: AtomicU8,
    blocks_per_packet: AtomicU16,
    sequence_reset: AtomicBool,
    pub stats: CaptureStats,
    data_ready: Signal<MutexType, ()>,
    attention: Signal<MutexType, ()>,
}

impl Default for BridgeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeContext {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Idle as u8),
            client_attached: AtomicBool::new(false),
            attach_epoch: AtomicU32::new(0),
            channels: AtomicU8::new(0),
            blocks_per_packet: AtomicU16::new(1),
            sequence_reset: AtomicBool::new(false),
            stats: CaptureStats::new(),
            data_ready: Signal::new(),
            attention: Signal::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        let previous =
            SessionState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            debug!("session {:?} -> {:?}", previous, state);
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == SessionState::Streaming
    }

    pub fn client_attached(&self) -> bool {
        self.client_attached.load(Ordering::Acquire)
    }

    pub fn attach_epoch(&self) -> u32 {
        self.attach_epoch.load(Ordering::Acquire)
    }

    /// Marks a client as attached and wakes the streamer.
    pub fn attach(&self) {
        self.attach_epoch.fetch_add(1, Ordering::AcqRel);
        self.client_attached.store(true, Ordering::Release);
        self.attention.signal(());
    }

    /// Resolves once a client is attached. Consumes pending wake-ups.
    pub async fn wait_for_client(&self) {
        while !self.client_attached() {
            self.attention.wait().await;
        }
    }

    pub fn detach(&self) {
        self.client_attached.store(false, Ordering::Release);
        self.attention.signal(());
    }

    pub fn channels(&self) -> u8 {
        self.channels.load(Ordering::Acquire)
    }

    pub fn device(&self) -> Option<DeviceVariant> {
        match self.channels() {
            4 => Some(DeviceVariant::Ads1299_4),
            6 => Some(DeviceVariant::Ads1299_6),
            8 => Some(DeviceVariant::Ads1299),
            _ => None,
        }
    }

    pub(crate) fn set_device(&self, variant: Option<DeviceVariant>) {
        let channels = variant.map_or(0, DeviceVariant::max_channels);
        self.channels.store(channels, Ordering::Release);
    }

    pub fn blocks_per_packet(&self) -> u16 {
        self.blocks_per_packet.load(Ordering::Acquire)
    }

    pub(crate) fn set_blocks_per_packet(&self, blocks: u16) {
        self.blocks_per_packet.store(blocks.max(1), Ordering::Release);
    }

    pub(crate) fn request_sequence_reset(&self) {
        self.sequence_reset.store(true, Ordering::Release);
    }

    pub(crate) fn take_sequence_reset(&self) -> bool {
        self.sequence_reset.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn notify_data_ready(&self) {
        self.data_ready.signal(());
    }

    /// Wakes the streamer out of its wait for samples, e.g. to send a
    /// pending reply.
    pub fn wake_streamer(&self) {
        self.attention.signal(());
    }

    pub(crate) fn data_ready(&self) -> &Signal<MutexType, ()> {
        &self.data_ready
    }

    pub(crate) fn attention(&self) -> &Signal<MutexType, ()> {
        &self.attention
    }
}
