mod common;

use ads1299::sim::SimAds;
use ads1299::Register;
use common::*;
use eeg_bridge_core::{
    AdsCell, BridgeContext, Capture, CaptureOutcome, Clock, Controller, Pumped,
    RecordQueue, Streamer,
};
use eeg_bridge_icd::{block_len, ControlCommand, TextCommand};
use embassy_futures::join::join;

/// 250 SPS low-latency: ten blocks per packet.
const TEN_BLOCKS: u8 = 0x01;

async fn start_streaming<C: Clock>(
    controller: &mut Controller<'_, SimAds, C>,
    ctx: &BridgeContext,
) {
    controller.boot().await.unwrap();
    controller.on_connect();
    controller
        .handle_control(ControlCommand::decode(TEN_BLOCKS).unwrap())
        .await
        .unwrap();
    assert_eq!(ctx.blocks_per_packet(), 10);
}

async fn feed(ads: &AdsCell<SimAds>, tags: impl IntoIterator<Item = u8>) {
    with_sim(ads, |sim| {
        for tag in tags {
            assert!(sim.push_frame(frame(tag)));
        }
    })
    .await;
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[futures_test::test]
async fn capture_ignores_edges_when_idle() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<8> = RecordQueue::new();
    let (producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    controller.boot().await.unwrap();
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));

    assert_eq!(capture.on_data_ready().await, CaptureOutcome::Inactive);
    assert_eq!(consumer.len(), 0);
    assert_eq!(ctx.stats.snapshot().captured, 0);
}

#[futures_test::test]
async fn capture_keeps_order_and_drops_newest_on_overflow() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<8> = RecordQueue::new();
    let capacity = queue.capacity();
    let (producer, mut consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(4000));

    feed(&ads, 0..=capacity as u8).await;
    for _ in 0..capacity {
        assert_eq!(capture.on_data_ready().await, CaptureOutcome::Queued);
    }
    assert_eq!(capture.on_data_ready().await, CaptureOutcome::Overflow);

    let stats = ctx.stats.snapshot();
    assert_eq!(stats.overflows, 1);
    assert_eq!(stats.captured, capacity as u32);

    let mut last_timestamp = 0;
    for i in 0..capacity {
        let record = consumer.dequeue().unwrap();
        assert_eq!(record.sequence(), i as u32);
        assert_eq!(record.payload(), &frame(i as u8)[..]);
        assert!(record.timestamp_us() > last_timestamp);
        last_timestamp = record.timestamp_us();
    }
    assert!(consumer.dequeue().is_none());
}

#[futures_test::test]
async fn record_carries_status_and_every_channel() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<4> = RecordQueue::new();
    let (producer, mut consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));

    feed(&ads, [0x10]).await;
    capture.on_data_ready().await;

    let record = consumer.dequeue().unwrap();
    assert_eq!(record.payload().len(), 27);
    assert!(record.frame().is_synced());
    assert_eq!(record.frame().sample(0), Some(0x10_1112));
}

#[futures_test::test]
async fn capture_counts_busy_and_bus_errors() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<4> = RecordQueue::new();
    let (producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));

    {
        let _held = ads.lock().await;
        assert_eq!(capture.on_data_ready().await, CaptureOutcome::Busy);
    }
    with_sim(&ads, |sim| sim.fail_next_transaction()).await;
    assert_eq!(capture.on_data_ready().await, CaptureOutcome::BusError);

    let stats = ctx.stats.snapshot();
    assert_eq!(stats.busy_skips, 1);
    assert_eq!(stats.bus_errors, 1);
    assert_eq!(consumer.len(), 0);
}

#[futures_test::test]
async fn start_command_resets_sequence() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<8> = RecordQueue::new();
    let (producer, mut consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));

    for _ in 0..3 {
        capture.on_data_ready().await;
    }
    assert_eq!(capture.sequence(), 3);
    controller.handle_text(TextCommand::Start).await;
    capture.on_data_ready().await;

    let sequences: Vec<u32> =
        core::iter::from_fn(|| consumer.dequeue()).map(|r| r.sequence()).collect();
    assert_eq!(sequences, [0, 1, 2, 0]);
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[futures_test::test]
async fn packets_hold_block_count_with_rolling_counter() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<32> = RecordQueue::new();
    let (producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));
    let mut streamer = Streamer::new(consumer, &ctx);
    let mut link = MockLink::default();

    feed(&ads, 0..25).await;
    for _ in 0..25 {
        assert_eq!(capture.on_data_ready().await, CaptureOutcome::Queued);
    }
    assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Sent));
    assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Sent));

    let block = block_len(8);
    assert_eq!(link.binary.len(), 2);
    for (p, packet) in link.binary.iter().enumerate() {
        assert_eq!(packet.len(), 10 * block);
        for (i, chunk) in packet.chunks(block).enumerate() {
            let n = (p * 10 + i) as u8;
            assert_eq!(chunk[0], n);
            assert_eq!(&chunk[1..], &frame(n)[..]);
        }
    }
    assert_eq!(streamer.packets_sent(), 2);
    assert_eq!(streamer.queued(), 5);
    assert_eq!(streamer.counter(), 20);
    let stats = ctx.stats.snapshot();
    assert_eq!(stats.packets_sent, 2);
    assert_eq!(stats.captured, 25);
}

#[futures_test::test]
async fn counter_wraps_across_packets() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_4_ID);
    let mut queue: RecordQueue<16> = RecordQueue::new();
    let (producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));
    let mut streamer = Streamer::new(consumer, &ctx);
    let mut link = MockLink::default();

    for _ in 0..26 {
        for _ in 0..10 {
            assert_eq!(capture.on_data_ready().await, CaptureOutcome::Queued);
        }
        assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Sent));
    }

    let block = block_len(4);
    let counters: Vec<u8> = link
        .binary
        .iter()
        .flat_map(|packet| {
            assert_eq!(packet.len(), 10 * block);
            packet.chunks(block).map(|chunk| chunk[0])
        })
        .collect();
    assert_eq!(counters.len(), 260);
    for (i, counter) in counters.iter().enumerate() {
        assert_eq!(*counter, (i % 256) as u8);
    }
}

#[futures_test::test]
async fn pump_returns_when_woken() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<4> = RecordQueue::new();
    let (_producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut streamer = Streamer::new(consumer, &ctx);
    let mut link = MockLink::default();

    ctx.wake_streamer();
    assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Interrupted));
    assert!(link.binary.is_empty());
}

#[futures_test::test]
async fn waiting_for_a_client_ends_on_attach() {
    let ctx = BridgeContext::new();
    join(ctx.wait_for_client(), async { ctx.attach() }).await;
    assert!(ctx.client_attached());
    // Already attached: returns at once.
    ctx.wait_for_client().await;
}

#[futures_test::test]
async fn failed_send_drops_the_packet() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<16> = RecordQueue::new();
    let (producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));
    let mut streamer = Streamer::new(consumer, &ctx);
    let mut link = MockLink { fail: true, ..Default::default() };

    for _ in 0..10 {
        capture.on_data_ready().await;
    }
    assert_eq!(streamer.pump(&mut link).await, Err(LinkDown));
    assert_eq!(streamer.packets_sent(), 0);
    assert!(!streamer.fill());
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[futures_test::test]
async fn disconnect_halts_capture() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<8> = RecordQueue::new();
    let (producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));
    let mut streamer = Streamer::new(consumer, &ctx);
    let mut link = MockLink::default();

    for _ in 0..3 {
        capture.on_data_ready().await;
    }
    controller.on_disconnect().await.unwrap();

    assert!(!ctx.is_streaming());
    assert_eq!(capture.on_data_ready().await, CaptureOutcome::Inactive);
    assert_eq!(streamer.queued(), 3);
    assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Interrupted));
    with_sim(&ads, |sim| {
        assert!(!sim.is_continuous());
        assert_eq!(sim.violations(), 0);
    })
    .await;
}

#[futures_test::test]
async fn attach_discards_stale_data_but_keeps_counter() {
    let ctx = BridgeContext::new();
    let ads = device(ADS1299_ID);
    let mut queue: RecordQueue<32> = RecordQueue::new();
    let (producer, consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));
    let mut streamer = Streamer::new(consumer, &ctx);
    let mut link = MockLink::default();

    for _ in 0..13 {
        capture.on_data_ready().await;
    }
    assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Sent));
    // Two leftovers go into the partial packet, one stays queued.
    capture.on_data_ready().await;
    capture.on_data_ready().await;
    assert!(!streamer.fill());
    capture.on_data_ready().await;
    assert_eq!(streamer.pending_blocks(), 5);
    assert_eq!(streamer.queued(), 1);
    assert_eq!(streamer.counter(), 15);

    controller.on_disconnect().await.unwrap();
    assert_eq!(streamer.queued(), 1);
    assert_eq!(streamer.pending_blocks(), 5);
    controller.on_connect();
    assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Interrupted));
    assert_eq!(streamer.queued(), 0);
    assert_eq!(streamer.pending_blocks(), 0);
    assert_eq!(link.binary.len(), 1);

    controller
        .handle_control(ControlCommand::decode(TEN_BLOCKS).unwrap())
        .await
        .unwrap();
    for _ in 0..10 {
        capture.on_data_ready().await;
    }
    assert_eq!(streamer.pump(&mut link).await, Ok(Pumped::Sent));
    let packet = &link.binary[1];
    assert_eq!(packet[0], 15);
    assert_eq!(packet.len(), 10 * block_len(8));
}

#[futures_test::test]
async fn register_reads_mid_stream_do_not_corrupt_frames() {
    let ctx = BridgeContext::new();
    let ads: AdsCell<SimAds> = device(ADS1299_ID);
    let mut queue: RecordQueue<16> = RecordQueue::new();
    let (producer, mut consumer) = queue.split();
    let mut controller = Controller::new(&ads, &ctx, ticks(1), BOARD);
    start_streaming(&mut controller, &ctx).await;
    let mut capture = Capture::new(&ads, &ctx, producer, ticks(1));

    feed(&ads, [1, 2]).await;
    capture.on_data_ready().await;
    controller
        .handle_text(TextCommand::Rreg { register: Register::CONFIG1.addr() })
        .await;
    capture.on_data_ready().await;

    assert_eq!(consumer.dequeue().unwrap().payload(), &frame(1)[..]);
    assert_eq!(consumer.dequeue().unwrap().payload(), &frame(2)[..]);
    with_sim(&ads, |sim| assert_eq!(sim.violations(), 0)).await;
}
