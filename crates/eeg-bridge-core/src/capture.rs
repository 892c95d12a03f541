use crate::queue::RecordProducer;
use crate::{AdsCell, BridgeContext, SampleRecord};
use embedded_hal_async::spi::SpiDevice;

/// Microsecond time source for record timestamps.
pub trait Clock {
    fn now_micros(&self) -> u64;
}

impl<F: Fn() -> u64> Clock for F {
    fn now_micros(&self) -> u64 {
        self()
    }
}

/// What one data-ready edge produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureOutcome {
    /// Not streaming; the edge was ignored.
    Inactive,
    /// The controller holds the device.
    Busy,
    BusError,
    /// Queue full, the new record was dropped.
    Overflow,
    Queued,
}

/// Interrupt-side capture stage: one frame read per data-ready edge.
///
/// Never waits on anything but the frame read itself. Failures are counted
/// in [`crate::CaptureStats`] and never propagate.
pub struct Capture<'a, SPI, C, const N: usize> {
    ads: &'a AdsCell<SPI>,
    ctx: &'a BridgeContext,
    producer: RecordProducer<'a, N>,
    clock: C,
    sequence: u32,
}

impl<'a, SPI, E, C, const N: usize> Capture<'a, SPI, C, N>
where
    SPI: SpiDevice<Error = E>,
    C: Clock,
{
    pub fn new(
        ads: &'a AdsCell<SPI>,
        ctx: &'a BridgeContext,
        producer: RecordProducer<'a, N>,
        clock: C,
    ) -> Self {
        Self { ads, ctx, producer, clock, sequence: 0 }
    }

    /// Sequence number the next record will carry.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub async fn on_data_ready(&mut self) -> CaptureOutcome {
        if !self.ctx.is_streaming() {
            return CaptureOutcome::Inactive;
        }
        let Ok(mut ads) = self.ads.try_lock() else {
            self.ctx.stats.record_busy_skip();
            return CaptureOutcome::Busy;
        };

        let timestamp_us = self.clock.now_micros();
        let frame = match ads.read_frame().await {
            Ok(frame) => frame,
            Err(_) => {
                self.ctx.stats.record_bus_error();
                return CaptureOutcome::BusError;
            }
        };
        drop(ads);

        if self.ctx.take_sequence_reset() {
            self.sequence = 0;
        }
        let record = SampleRecord::new(timestamp_us, self.sequence, frame);
        self.sequence = self.sequence.wrapping_add(1);

        match self.producer.enqueue(record) {
            Ok(()) => {
                self.ctx.stats.record_captured();
                self.ctx.notify_data_ready();
                CaptureOutcome::Queued
            }
            Err(_) => {
                self.ctx.stats.record_overflow();
                CaptureOutcome::Overflow
            }
        }
    }
}
