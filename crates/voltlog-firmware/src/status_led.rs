//! Status LED driven by logger events

use embassy_time::{Duration, Timer};
use esp_hal::gpio::Output;
use log::debug;

use voltlog_core::events::{EventSubscriber, LoggerEvent};

/// How long the LED stays lit after a sample is recorded
pub const BLINK_DURATION: Duration = Duration::from_millis(100);

/// Blink once per recorded sample
#[embassy_executor::task]
pub async fn status_led_task(mut led: Output<'static>, mut events: EventSubscriber<'static>) {
    loop {
        match events.next_message_pure().await {
            LoggerEvent::Sampled { index, .. } => {
                led.set_high();
                Timer::after(BLINK_DURATION).await;
                led.set_low();
                debug!("Sample {} recorded", index);
            }
            LoggerEvent::Averaged { .. } => {}
        }
    }
}
