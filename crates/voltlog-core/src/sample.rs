//! Sample records stored in the raw and averaged rings.

use core::fmt::Display;

use crate::clock::UNSET_TIMESTAMP;

/// Number of analog channels recorded per sample
pub const CHANNELS: usize = 4;

/// Analog input channel
///
/// The order is fixed: it is the order of the voltages inside every
/// [`Sample`] and [`AveragedSample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    V1,
    V2,
    V3,
    V4,
}

impl Channel {
    /// All channels in storage order
    pub const ALL: [Channel; CHANNELS] = [Self::V1, Self::V2, Self::V3, Self::V4];

    /// Position of this channel's voltage in a sample
    pub const fn index(self) -> usize {
        match self {
            Self::V1 => 0,
            Self::V2 => 1,
            Self::V3 => 2,
            Self::V4 => 3,
        }
    }

    /// Get a short label for display
    pub const fn label(self) -> &'static str {
        match self {
            Self::V1 => "V1",
            Self::V2 => "V2",
            Self::V3 => "V3",
            Self::V4 => "V4",
        }
    }
}

/// One reading of all channels, recorded every sampling tick
///
/// A zeroed sample (timestamp [`UNSET_TIMESTAMP`]) is the sentinel every ring
/// slot holds before it is first written.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Voltage per channel, in volts
    pub voltages: [f32; CHANNELS],
    /// Seconds since epoch, 0 while the wall clock is not synchronized
    pub timestamp: u32,
}

impl Sample {
    /// Sentinel stored in unwritten slots
    pub const EMPTY: Self = Self {
        voltages: [0.0; CHANNELS],
        timestamp: UNSET_TIMESTAMP,
    };

    /// Create a new sample with the given timestamp and channel voltages
    pub const fn new(timestamp: u32, voltages: [f32; CHANNELS]) -> Self {
        Self {
            voltages,
            timestamp,
        }
    }

    /// Voltage recorded for `channel`
    pub const fn voltage(&self, channel: Channel) -> f32 {
        self.voltages[channel.index()]
    }

    /// Wall-clock time of the reading, or `None` if the clock was not yet set
    pub const fn time(&self) -> Option<u32> {
        if self.timestamp == UNSET_TIMESTAMP {
            None
        } else {
            Some(self.timestamp)
        }
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Sample] timestamp: {}, V1: {:.3} V, V2: {:.3} V, V3: {:.3} V, V4: {:.3} V",
            self.timestamp, self.voltages[0], self.voltages[1], self.voltages[2], self.voltages[3]
        )
    }
}

/// Per-channel mean of one averaging window
///
/// Tagged with the timestamp of the last raw sample in the window, not the
/// window midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AveragedSample {
    /// Mean voltage per channel, in volts
    pub voltages: [f32; CHANNELS],
    /// Timestamp of the window's last raw sample
    pub timestamp: u32,
}

impl AveragedSample {
    /// Sentinel stored in unwritten slots
    pub const EMPTY: Self = Self {
        voltages: [0.0; CHANNELS],
        timestamp: UNSET_TIMESTAMP,
    };

    /// Create an averaged sample from per-channel sums over `count` samples
    pub fn from_sums(timestamp: u32, sums: &[f32; CHANNELS], count: usize) -> Self {
        let divisor = count as f32;
        let mut voltages = [0.0; CHANNELS];
        for (avg, sum) in voltages.iter_mut().zip(sums) {
            *avg = sum / divisor;
        }

        Self {
            voltages,
            timestamp,
        }
    }

    /// Mean voltage for `channel`
    pub const fn voltage(&self, channel: Channel) -> f32 {
        self.voltages[channel.index()]
    }

    /// Wall-clock time of the window end, or `None` if the clock was not yet set
    pub const fn time(&self) -> Option<u32> {
        if self.timestamp == UNSET_TIMESTAMP {
            None
        } else {
            Some(self.timestamp)
        }
    }
}

impl Display for AveragedSample {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[AveragedSample] end_ts: {}, avg: {:.3} V, {:.3} V, {:.3} V, {:.3} V",
            self.timestamp, self.voltages[0], self.voltages[1], self.voltages[2], self.voltages[3]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample_has_no_time() {
        assert_eq!(Sample::EMPTY.time(), None);
        assert_eq!(AveragedSample::EMPTY.time(), None);
        assert_eq!(Sample::default(), Sample::EMPTY);
    }

    #[test]
    fn test_channel_order() {
        let sample = Sample::new(1000, [1.0, 2.0, 3.0, 4.0]);
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
            assert_eq!(sample.voltage(*channel), (i + 1) as f32);
        }
        assert_eq!(sample.time(), Some(1000));
    }

    #[test]
    fn test_averaged_from_sums() {
        let avg = AveragedSample::from_sums(1200, &[1830.0, 0.0, 120.0, -60.0], 60);
        assert_eq!(avg.voltages, [30.5, 0.0, 2.0, -1.0]);
        assert_eq!(avg.voltage(Channel::V1), 30.5);
        assert_eq!(avg.time(), Some(1200));
    }
}
