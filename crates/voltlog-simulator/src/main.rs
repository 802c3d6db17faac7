//! Desktop simulator for the voltlog four-channel voltage logger.
//!
//! Drives the voltlog-core engine with a synthetic ADC and a simulated uptime
//! counter, as fast as the host allows, then prints the stored history the way
//! a renderer would request it.
//!
//! ```text
//! voltlog-simulator [HOURS] [CONFIG_BLOB]
//! ```
//!
//! `HOURS` defaults to 26 (two full wraps of the default 12 h raw ring plus
//! change). `CONFIG_BLOB` is an optional postcard-encoded [`Config`].
//! Set `RUST_LOG=debug` to see every completed window.

use std::cell::Cell;
use std::process::ExitCode;
use std::rc::Rc;

use log::{error, info, warn};

use voltlog_core::events::{EventChannel, LoggerEvent, publish_outcome};
use voltlog_core::{
    AdcChannel, Aggregator, CHANNELS, Channel, Config, NoiseAveragingReader, SyncedClock,
};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Hours simulated when no argument is given.
const DEFAULT_HOURS: u64 = 26;

/// Simulated uptime after which network time becomes available.
const TIME_SYNC_AFTER_SECS: u64 = 95;

/// Epoch reported by the simulated time server at the moment of sync.
const SIMULATED_EPOCH: u32 = 1_760_000_000;

// ---------------------------------------------------------------------------
// Mock ADC
// ---------------------------------------------------------------------------

/// Synthetic ADC producing slowly varying input voltages plus a few counts of
/// deterministic noise.
struct MockAdc {
    /// Shared simulated uptime in seconds
    uptime: Rc<Cell<u64>>,
    config: Config,
    reads: u32,
}

impl MockAdc {
    fn new(uptime: Rc<Cell<u64>>, config: Config) -> Self {
        Self {
            uptime,
            config,
            reads: 0,
        }
    }

    /// Input voltage on `channel` at uptime `t` seconds.
    fn input_volts(channel: Channel, t: f64) -> f64 {
        match channel {
            // Battery: 12.6 V with a slow swing
            Channel::V1 => 12.6 + 0.4 * (t / 3600.0).sin(),
            // Solar panel: 0–18 V over a simulated day, clipped at night
            Channel::V2 => (18.0 * (t / 86_400.0 * core::f64::consts::TAU).sin()).max(0.0),
            // Regulated rail
            Channel::V3 => 5.0,
            // Sawtooth over one hour
            Channel::V4 => 20.0 * ((t % 3600.0) / 3600.0),
        }
    }
}

impl AdcChannel for MockAdc {
    fn read_raw(&mut self, channel: Channel) -> u16 {
        self.reads = self.reads.wrapping_add(1);
        let adc = self.config.adc;

        let volts = Self::input_volts(channel, self.uptime.get() as f64);
        let pin_volts = volts / f64::from(adc.divider_ratio());
        let counts = pin_volts / f64::from(adc.reference_volts) * f64::from(adc.full_scale);
        let noise = f64::from(self.reads % 5) - 2.0;

        (counts + noise).clamp(0.0, f64::from(adc.full_scale)) as u16
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn load_config(path: Option<String>) -> Result<Config, ExitCode> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let bytes = std::fs::read(&path).map_err(|e| {
        error!("Cannot read config blob {}: {}", path, e);
        ExitCode::FAILURE
    })?;
    Config::from_bytes(&bytes).map_err(|e| {
        error!("Invalid config blob {}: {}", path, e);
        ExitCode::FAILURE
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let hours = match args.next().map(|arg| arg.parse::<u64>()) {
        None => DEFAULT_HOURS,
        Some(Ok(hours)) => hours,
        Some(Err(e)) => {
            error!("HOURS must be a whole number: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = match load_config(args.next()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let geometry = match config.sampling.geometry() {
        Ok(geometry) => geometry,
        Err(e) => {
            error!("Invalid sampling configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting voltlog simulator for {} h", hours);
    info!(
        "Rings: {} raw samples every {}s, {} averages of {} samples",
        geometry.total_samples(),
        config.sampling.sample_interval_secs,
        geometry.average_slots(),
        geometry.samples_per_avg()
    );

    let uptime = Rc::new(Cell::new(0u64));
    let clock_uptime = Rc::clone(&uptime);
    let mut clock = SyncedClock::new(move || clock_uptime.get());
    let mut reader =
        NoiseAveragingReader::new(MockAdc::new(Rc::clone(&uptime), config), config.adc);
    let mut engine = Aggregator::new(geometry);

    let channel = EventChannel::new();
    let Ok(publisher) = channel.publisher() else {
        error!("Failed to create event publisher");
        return ExitCode::FAILURE;
    };
    let Ok(mut subscriber) = channel.subscriber() else {
        error!("Failed to create event subscriber");
        return ExitCode::FAILURE;
    };

    let interval = u64::from(config.sampling.sample_interval_secs);
    let Some(total_ticks) = simulated_ticks(hours, interval) else {
        error!("{} h is too long to simulate", hours);
        return ExitCode::FAILURE;
    };
    let mut unstamped = 0u64;

    // -----------------------------------------------------------------------
    // Tick loop
    // -----------------------------------------------------------------------
    for _ in 0..total_ticks {
        uptime.set(uptime.get() + interval);

        if !clock.is_synced() && uptime.get() >= TIME_SYNC_AFTER_SECS {
            clock.sync(SIMULATED_EPOCH);
        }

        let outcome = engine.on_tick(&mut reader, &clock);
        publish_outcome(&publisher, &outcome);

        while let Some(message) = subscriber.try_next_message_pure() {
            match message {
                LoggerEvent::Sampled { sample, .. } => {
                    if sample.time().is_none() {
                        unstamped += 1;
                    }
                }
                LoggerEvent::Averaged { slot, average } => {
                    log::debug!("slot {:>3}: {}", slot, average);
                }
            }
        }
    }

    if unstamped > 0 {
        warn!("{} samples were recorded before the clock was set", unstamped);
    }

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------
    info!(
        "Recorded {} samples, {} windows (cursor at {})",
        engine.ticks(),
        engine.windows_completed(),
        engine.cursor()
    );

    match engine.latest_raw_sample() {
        Some(sample) => info!("Latest: {}", sample),
        None => info!("Latest: no data yet"),
    }
    match engine.latest_average() {
        Some(average) => info!("Latest average: {}", average),
        None => info!("Latest average: no data yet"),
    }

    let history = engine.average_history(config.display.graph_points);
    println!("timestamp,{}", channel_header());
    for average in &history {
        let time = average
            .time()
            .map_or_else(|| "unset".to_string(), |t| t.to_string());
        let volts: Vec<String> = average.voltages.iter().map(|v| format!("{v:.3}")).collect();
        println!("{},{}", time, volts.join(","));
    }

    info!("Simulator exiting");
    ExitCode::SUCCESS
}

/// Number of ticks in `hours` at one tick per `interval_secs`, `None` on overflow.
fn simulated_ticks(hours: u64, interval_secs: u64) -> Option<u64> {
    hours.checked_mul(3600)?.checked_div(interval_secs)
}

fn channel_header() -> String {
    let labels: [&str; CHANNELS] = Channel::ALL.map(Channel::label);
    labels.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_ticks() {
        assert_eq!(simulated_ticks(26, 10), Some(9360));
        assert_eq!(simulated_ticks(0, 10), Some(0));
    }

    #[test]
    fn test_simulated_ticks_rejects_huge_hours() {
        assert_eq!(simulated_ticks(u64::MAX / 1000, 10), None);
        assert_eq!(simulated_ticks(u64::MAX, 10), None);
    }

    #[test]
    fn test_channel_header() {
        assert_eq!(channel_header(), "V1,V2,V3,V4");
    }
}
