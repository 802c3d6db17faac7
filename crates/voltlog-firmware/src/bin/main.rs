#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::{Instant, Ticker};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};

use voltlog_core::events::{EventChannel, publish_outcome};
use voltlog_core::{Aggregator, Config, NoiseAveragingReader, RingGeometry, SyncedClock};
use voltlog_firmware::adc::EspAdc;
use voltlog_firmware::status_led::status_led_task;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Global pub-sub channel for logger events
static LOGGER_EVENTS: EventChannel = EventChannel::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(log::LevelFilter::Info);

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // The raw ring alone is ~84 KB; it lives in PSRAM.
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let config = Config::default();
    let geometry = config.sampling.geometry().unwrap_or_else(|e| {
        error!("Invalid sampling configuration ({}), using defaults", e);
        RingGeometry::default()
    });

    let adc = EspAdc::new(
        peripherals.ADC1,
        peripherals.GPIO4,
        peripherals.GPIO5,
        peripherals.GPIO6,
        peripherals.GPIO7,
    );
    let mut reader = NoiseAveragingReader::new(adc, config.adc);

    // This build has no network stack, so nothing calls `clock.sync` and every
    // sample is stored with an unset timestamp. Readers get `time() == None`.
    let clock = SyncedClock::new(|| Instant::now().as_secs());
    if !clock.is_synced() {
        info!("No time source configured; samples will carry no wall-clock time");
    }

    let mut engine = Aggregator::new(geometry);
    info!(
        "Logging {} samples every {}s, averaging every {} samples",
        geometry.total_samples(),
        config.sampling.sample_interval_secs,
        geometry.samples_per_avg()
    );

    let led = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());
    let subscriber = LOGGER_EVENTS
        .subscriber()
        .expect("Failed to create subscriber");
    spawner.spawn(status_led_task(led, subscriber).expect("Failed to spawn status LED task"));

    let publisher = LOGGER_EVENTS
        .publisher()
        .expect("Failed to create publisher");

    let mut ticker = Ticker::every(config.sampling.sample_interval());
    loop {
        ticker.next().await;

        let outcome = engine.on_tick(&mut reader, &clock);
        publish_outcome(&publisher, &outcome);

        if let Some((slot, average)) = outcome.average {
            info!("Average slot {}: {}", slot, average);
        }
    }
}
