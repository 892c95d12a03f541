use crate::queue::RecordConsumer;
use crate::{BridgeContext, SampleRecord};
use eeg_bridge_icd::packet::{COUNTER_LEN, MAX_BLOCKS, MAX_PACKET_LEN};
use embassy_futures::select::{select, Either};
use heapless::Vec;

/// Message-oriented transport to the attached client.
#[allow(async_fn_in_trait)]
pub trait Link {
    type Error;

    /// Sends one sample packet as a single binary message.
    async fn send_binary(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    async fn send_text(&mut self, payload: &[u8]) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pumped {
    /// A full packet went out.
    Sent,
    /// Woken for something other than samples: a pending reply, a state
    /// change or a detach. The partial packet is kept.
    Interrupted,
}

/// Drains the record queue into fixed-size packets.
///
/// Each block is one rolling counter byte followed by the record payload.
/// The counter advances once per block and wraps at 256; it runs across
/// packets and sessions.
pub struct Streamer<'a, const N: usize> {
    consumer: RecordConsumer<'a, N>,
    ctx: &'a BridgeContext,
    packet: Vec<u8, MAX_PACKET_LEN>,
    blocks: u16,
    /// Block count of the packet being built, fixed at its first block.
    target: u16,
    counter: u8,
    packets_sent: u32,
    /// Attach epoch of the client the queued data belongs to.
    epoch: u32,
}

impl<'a, const N: usize> Streamer<'a, N> {
    pub fn new(consumer: RecordConsumer<'a, N>, ctx: &'a BridgeContext) -> Self {
        Self {
            consumer,
            ctx,
            packet: Vec::new(),
            blocks: 0,
            target: 0,
            counter: 0,
            packets_sent: 0,
            epoch: ctx.attach_epoch(),
        }
    }

    /// Counter value the next block will carry.
    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn packets_sent(&self) -> u32 {
        self.packets_sent
    }

    pub fn queued(&self) -> usize {
        self.consumer.len()
    }

    /// Blocks already moved into the packet being built.
    pub fn pending_blocks(&self) -> u16 {
        self.blocks
    }

    /// Throws away queued records and the partial packet. [`Self::pump`]
    /// does this on its own when a new client attaches.
    pub fn discard_stale(&mut self) -> usize {
        let mut dropped = self.blocks as usize;
        while self.consumer.dequeue().is_some() {
            dropped += 1;
        }
        self.packet.clear();
        self.blocks = 0;
        dropped
    }

    /// Moves queued records into the packet. Returns `true` once it holds
    /// the full block count.
    pub fn fill(&mut self) -> bool {
        if self.blocks == 0 {
            self.target = self.ctx.blocks_per_packet().clamp(1, MAX_BLOCKS as u16);
        }
        while self.blocks < self.target {
            let Some(record) = self.consumer.dequeue() else {
                return false;
            };
            if !self.push_block(&record) {
                warn!("packet buffer full at {} blocks", self.blocks);
                self.target = self.blocks;
                break;
            }
        }
        self.blocks > 0
    }

    fn push_block(&mut self, record: &SampleRecord) -> bool {
        let payload = record.payload();
        if self.packet.capacity() - self.packet.len() < COUNTER_LEN + payload.len() {
            return false;
        }
        // Room was checked above.
        let _ = self.packet.push(self.counter);
        let _ = self.packet.extend_from_slice(payload);
        self.counter = self.counter.wrapping_add(1);
        self.blocks += 1;
        true
    }

    /// Waits for a full packet and sends it.
    ///
    /// Returns [`Pumped::Interrupted`] without sending when the client is
    /// gone or someone called [`BridgeContext::wake_streamer`].
    pub async fn pump<L: Link>(&mut self, link: &mut L) -> Result<Pumped, L::Error> {
        loop {
            if !self.ctx.client_attached() {
                return Ok(Pumped::Interrupted);
            }
            let epoch = self.ctx.attach_epoch();
            if epoch != self.epoch {
                self.epoch = epoch;
                let dropped = self.discard_stale();
                debug!("new client, dropped {} stale blocks", dropped);
            }
            if self.fill() {
                let sent = link.send_binary(&self.packet).await;
                self.packet.clear();
                self.blocks = 0;
                sent?;
                self.packets_sent = self.packets_sent.wrapping_add(1);
                self.ctx.stats.record_packet_sent();
                return Ok(Pumped::Sent);
            }
            match select(self.ctx.data_ready().wait(), self.ctx.attention().wait())
                .await
            {
                Either::First(()) => continue,
                Either::Second(()) => return Ok(Pumped::Interrupted),
            }
        }
    }
}
