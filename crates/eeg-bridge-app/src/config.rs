//! Boot-time constants.
use ads1299::SampleRate;
use eeg_bridge_core::BoardInfo;
use embassy_time::Duration;

/// Slots in the capture-to-streamer queue. One slot is always kept free,
/// so `QUEUE_DEPTH - 1` records can be pending.
pub const QUEUE_DEPTH: usize = 256;

/// Rate programmed at boot and after a `reset` text command.
pub const DEFAULT_RATE: SampleRate = SampleRate::Sps250;
pub const DEFAULT_LOW_LATENCY: bool = false;

/// Encoded text replies waiting for the streamer.
pub const REPLY_DEPTH: usize = 4;

pub const BOARD: BoardInfo =
    BoardInfo { board_name: "eeg-bridge", maker_name: MANUFACTURER };
pub const MANUFACTURER: &str = "EEG Bridge Project";

pub const USB_VID: u16 = 0x16c0;
pub const USB_PID: u16 = 0x27dd;
pub const USB_PRODUCT: &str = "eeg-bridge";
pub const USB_SERIAL: &str = "00000001";
pub const USB_PACKET_SIZE: u16 = 64;

pub const STATS_INTERVAL: Duration = Duration::from_secs(10);
pub const WATCHDOG_PET_INTERVAL: Duration = Duration::from_secs(2);
