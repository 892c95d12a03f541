use crate::prelude::*;

/// Runs one capture step per DRDY falling edge. Spawned on the
/// interrupt-priority executor; reports only through `CONTEXT.stats`.
#[embassy_executor::task]
pub async fn capture_task(
    ads: &'static AppAdsCell,
    producer: RecordProducer<'static, QUEUE_DEPTH>,
    pins: AdsPins,
) {
    // The control outputs stay bound for the life of the task.
    let AdsPins { mut drdy, start: _start, reset: _reset, pwdn: _pwdn } = pins;
    let mut capture =
        eeg_bridge_core::Capture::new(ads, &CONTEXT, producer, uptime_micros as AppClock);

    loop {
        drdy.wait_for_falling_edge().await;
        capture.on_data_ready().await;
    }
}
