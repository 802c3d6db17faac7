//! Voltage acquisition seam between the engine and the ADC hardware.
//!
//! The engine only sees [`VoltageReader`]: one call, four voltages. The
//! [`NoiseAveragingReader`] implements it on top of raw ADC conversions by
//! averaging several reads per channel and scaling through the input voltage
//! divider. That noise averaging is a separate stage from the engine's
//! window averaging.

use log::trace;

use crate::config::AdcConfig;
use crate::sample::{CHANNELS, Channel};

/// Source of one set of channel voltages, in channel order
pub trait VoltageReader {
    fn read_channel_voltages(&mut self) -> [f32; CHANNELS];
}

impl<F> VoltageReader for F
where
    F: FnMut() -> [f32; CHANNELS],
{
    fn read_channel_voltages(&mut self) -> [f32; CHANNELS] {
        self()
    }
}

/// Raw ADC access: one conversion of the pin wired to `channel`
///
/// Implemented by the firmware over the ESP32 ADC and by tests with fixed
/// counts.
pub trait AdcChannel {
    fn read_raw(&mut self, channel: Channel) -> u16;
}

/// [`VoltageReader`] that averages `reads_per_sample` conversions per channel
pub struct NoiseAveragingReader<A> {
    adc: A,
    calibration: AdcConfig,
}

impl<A: AdcChannel> NoiseAveragingReader<A> {
    pub fn new(adc: A, calibration: AdcConfig) -> Self {
        Self { adc, calibration }
    }

    /// Averaged voltage at the divider input for a single channel
    pub fn read_channel(&mut self, channel: Channel) -> f32 {
        let reads = self.calibration.reads_per_sample.max(1);
        let sum: u32 = (0..reads)
            .map(|_| u32::from(self.adc.read_raw(channel)))
            .sum();
        let mean_counts = sum as f32 / f32::from(reads);
        let volts = self.calibration.counts_to_volts(mean_counts);

        trace!(
            "{}: {} reads, mean {:.1} counts, {:.3} V",
            channel.label(),
            reads,
            mean_counts,
            volts
        );
        volts
    }

    /// Give back the wrapped ADC
    pub fn into_inner(self) -> A {
        self.adc
    }
}

impl<A: AdcChannel> VoltageReader for NoiseAveragingReader<A> {
    fn read_channel_voltages(&mut self) -> [f32; CHANNELS] {
        Channel::ALL.map(|channel| self.read_channel(channel))
    }
}
