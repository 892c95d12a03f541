//! Acquisition pipeline between an ADS1299 and a streaming client.
//!
//! ```text
//!  DRDY edge ──► Capture ──► RecordQueue (SPSC) ──► Streamer ──► Link
//!                  ▲                                              │
//!                  └──── AdsCell ◄──── Controller ◄── commands ◄──┘
//! ```
//!
//! [`Capture`] runs at interrupt priority and only ever `try_lock`s the
//! device. The [`Controller`] is the one place that changes device
//! configuration and the session state, and does so through a
//! [`Configuring`] token so registers are never touched while streaming.
#![no_std]

pub(crate) mod fmt;

mod capture;
mod context;
mod controller;
mod error;
pub mod queue;
mod record;
mod stream;

pub use capture::{Capture, CaptureOutcome, Clock};
pub use context::{BridgeContext, CaptureStats, SessionState, StatsSnapshot};
pub use controller::{BoardInfo, Configuring, Controller};
pub use error::Error;
pub use queue::{RecordConsumer, RecordProducer, RecordQueue};
pub use record::SampleRecord;
pub use stream::{Link, Pumped, Streamer};

use ads1299::Ads1299;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

pub type MutexType = CriticalSectionRawMutex;

/// The device, shared between the capture stage and the controller.
pub type AdsCell<SPI> = Mutex<MutexType, Ads1299<SPI>>;
