use crate::prelude::*;
use embassy_nrf::peripherals::WDT;
use embassy_nrf::wdt;
use embassy_nrf::wdt::Watchdog;
use embassy_nrf::Peri;
use embassy_time::Ticker;

pub mod capture;
pub mod usb;

// Re-exports
pub use capture::*;
pub use usb::*;

// Keeps our system alive
#[embassy_executor::task]
pub async fn watchdog_task(wdt: Peri<'static, WDT>) {
    let Some(wdt_config) = wdt::Config::try_new(&wdt) else {
        warn!("watchdog config unavailable, running without it");
        return;
    };
    let (_wdt, [mut handle]) = match Watchdog::try_new(wdt, wdt_config) {
        Ok(x) => x,
        Err(_) => {
            // Watchdog already active with the wrong number of handles, waiting for it to timeout...
            loop {
                cortex_m::asm::wfe();
            }
        }
    };
    loop {
        handle.pet();
        Timer::after(WATCHDOG_PET_INTERVAL).await;
    }
}

/// Periodic health line: capture counters and the session state.
#[embassy_executor::task]
pub async fn stats_task() {
    let mut ticker = Ticker::every(STATS_INTERVAL);
    loop {
        ticker.next().await;
        let stats = CONTEXT.stats.snapshot();
        info!(
            "{:?}: captured {} sent {} overflows {} bus errors {} busy skips {}",
            CONTEXT.state(),
            stats.captured,
            stats.packets_sent,
            stats.overflows,
            stats.bus_errors,
            stats.busy_skips,
        );
    }
}
