#![no_std]

mod fmt;

pub mod config;
pub mod events;
pub mod tasks;

use config::{QUEUE_DEPTH, REPLY_DEPTH};
use eeg_bridge_bsp::AdsSpi;
use eeg_bridge_core::{AdsCell, BridgeContext, Controller, Streamer};
use eeg_bridge_icd::ReplyBuf;
use embassy_executor::{InterruptExecutor, SendSpawner};
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::Instant;

pub use eeg_bridge_core::MutexType;

pub const HW_VERSION: &str = env!("HW_VERSION");
pub const FW_VERSION: &str = env!("FW_VERSION");

pub type AppAds = AdsSpi<MutexType>;
pub type AppAdsCell = AdsCell<AppAds>;
pub type AppClock = fn() -> u64;
pub type AppController = Controller<'static, AppAds, AppClock>;
pub type AppStreamer = Streamer<'static, QUEUE_DEPTH>;

/// Timestamp source for sample records and the `micros` command.
pub fn uptime_micros() -> u64 {
    Instant::now().as_micros()
}

// Statics
pub static CONTEXT: BridgeContext = BridgeContext::new();

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

/// Inbound events for the control task. A single slot: the next command is
/// only accepted once the previous one has been handled.
pub type EventChannel = Channel<MutexType, events::Event, 1>;
pub type EventSender = Sender<'static, MutexType, events::Event, 1>;
pub type EventReceiver = Receiver<'static, MutexType, events::Event, 1>;
pub static EVENTS: EventChannel = Channel::new();

pub type ReplyChannel = Channel<MutexType, ReplyBuf, REPLY_DEPTH>;
pub static REPLIES: ReplyChannel = Channel::new();

// Interrupt executors
#[interrupt]
unsafe fn EGU1_SWI1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Starts the interrupt-priority executor that runs the capture task.
pub fn init_executors() -> SendSpawner {
    // High-priority executor: EGU1_SWI1, priority level 6
    interrupt::EGU1_SWI1.set_priority(Priority::P6);
    EXECUTOR_HIGH.start(interrupt::EGU1_SWI1)
}

pub mod prelude {
    pub use super::{
        config::*, debug, error, events::*, info, init_executors, tasks::*,
        trace, unwrap, uptime_micros, warn, AppAds, AppAdsCell, AppClock,
        AppController, AppStreamer, EventReceiver, EventSender, MutexType,
        CONTEXT, EVENTS, FW_VERSION, HW_VERSION, REPLIES,
    };
    pub use embassy_executor::Spawner;
    pub use embassy_time::{Duration, Timer};

    pub use ads1299::Ads1299;
    pub use eeg_bridge_bsp::{AdsHardware, AdsPins, EegBridge, SpiBus};
    pub use eeg_bridge_core::{
        BridgeContext, Controller, RecordProducer, RecordQueue, Streamer,
    };
    pub use eeg_bridge_icd::{self as icd, Inbound, TextReply};
}
