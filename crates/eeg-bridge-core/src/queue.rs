//! Hand-off from the capture stage to the streamer.
//!
//! A `heapless` single-producer single-consumer ring. The capture stage owns
//! the [`RecordProducer`], the streamer owns the [`RecordConsumer`]. Neither
//! side blocks; a full ring rejects the newest record.

use crate::SampleRecord;
use heapless::spsc::{Consumer, Producer, Queue};

/// Ring of `N` slots, holding at most `N - 1` records.
pub type RecordQueue<const N: usize> = Queue<SampleRecord, N>;
pub type RecordProducer<'a, const N: usize> = Producer<'a, SampleRecord, N>;
pub type RecordConsumer<'a, const N: usize> = Consumer<'a, SampleRecord, N>;
