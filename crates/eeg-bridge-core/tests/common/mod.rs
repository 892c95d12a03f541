#![allow(dead_code)]

use std::cell::Cell;

use ads1299::sim::SimAds;
use ads1299::{Ads1299, MAX_FRAME_LEN};
use eeg_bridge_core::{AdsCell, BoardInfo, Link};

pub const ADS1299_ID: u8 = 0x3E;
pub const ADS1299_4_ID: u8 = 0x3C;

pub const BOARD: BoardInfo =
    BoardInfo { board_name: "eeg-bridge", maker_name: "test-lab" };

pub fn device(id: u8) -> AdsCell<SimAds> {
    AdsCell::new(Ads1299::new(SimAds::new(id)))
}

/// Clock advancing by `step` microseconds per reading.
pub fn ticks(step: u64) -> impl Fn() -> u64 {
    let now = Cell::new(0u64);
    move || {
        now.set(now.get() + step);
        now.get()
    }
}

/// Valid status word, then samples counting up from `tag`.
pub fn frame(tag: u8) -> [u8; MAX_FRAME_LEN] {
    let mut bytes = [0u8; MAX_FRAME_LEN];
    bytes[0] = 0xC0;
    for (i, b) in bytes[3..].iter_mut().enumerate() {
        *b = tag.wrapping_add(i as u8);
    }
    bytes
}

/// Runs `f` against the simulated chip.
pub async fn with_sim<R>(
    ads: &AdsCell<SimAds>,
    f: impl FnOnce(&mut SimAds) -> R,
) -> R {
    let mut guard = ads.lock().await;
    f(guard.spi_mut())
}

#[derive(Default)]
pub struct MockLink {
    pub binary: Vec<Vec<u8>>,
    pub text: Vec<Vec<u8>>,
    pub fail: bool,
}

#[derive(Debug, PartialEq)]
pub struct LinkDown;

impl Link for MockLink {
    type Error = LinkDown;

    async fn send_binary(&mut self, payload: &[u8]) -> Result<(), LinkDown> {
        if self.fail {
            return Err(LinkDown);
        }
        self.binary.push(payload.to_vec());
        Ok(())
    }

    async fn send_text(&mut self, payload: &[u8]) -> Result<(), LinkDown> {
        if self.fail {
            return Err(LinkDown);
        }
        self.text.push(payload.to_vec());
        Ok(())
    }
}
