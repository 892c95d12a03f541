#![no_std]
#![no_main]

use static_cell::StaticCell;

#[cfg(feature = "defmt")]
use defmt_rtt as _;
#[cfg(feature = "defmt")]
use panic_probe as _;
#[cfg(not(feature = "defmt"))]
use panic_reset as _;

use eeg_bridge_app::prelude::*;

static SPI3_BUS: StaticCell<SpiBus<MutexType>> = StaticCell::new();
static ADS: StaticCell<AppAdsCell> = StaticCell::new();
static RECORD_QUEUE: StaticCell<RecordQueue<QUEUE_DEPTH>> = StaticCell::new();
static STREAMER: StaticCell<AppStreamer> = StaticCell::new();

// Application main entry point. The spawner can be used to start async tasks.
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("eeg-bridge {} on {}", FW_VERSION, HW_VERSION);
    // First we initialize our board.
    let board = EegBridge::default();

    spawner.must_spawn(watchdog_task(board.wdt));

    let high_prio_spawner = init_executors();

    let bus = SPI3_BUS.init(board.spi3_bus_resources.get_bus());
    let AdsHardware { spi, pins } = board.ads_resources.configure(bus).await;
    let ads: &'static AppAdsCell = ADS.init(AppAdsCell::new(Ads1299::new(spi)));

    let (producer, consumer) = RECORD_QUEUE.init_with(RecordQueue::new).split();
    let streamer = STREAMER.init_with(|| Streamer::new(consumer, &CONTEXT));

    let controller: AppController =
        Controller::new(ads, &CONTEXT, uptime_micros as AppClock, BOARD)
            .with_default_rate(DEFAULT_RATE, DEFAULT_LOW_LATENCY);

    high_prio_spawner.must_spawn(capture_task(ads, producer, pins));
    spawner.must_spawn(control_task(controller, EVENTS.receiver()));

    let (device, sender, receiver) = init_usb(board.usb);
    spawner.must_spawn(usb_task(device));
    spawner.must_spawn(rx_task(receiver, EVENTS.sender()));
    spawner.must_spawn(stream_task(UsbLink::new(sender), streamer));
    spawner.must_spawn(stats_task());
}
