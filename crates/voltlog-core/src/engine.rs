//! Sampling and aggregation engine.
//!
//! [`Aggregator`] owns both rings and the write cursor. Every tick writes one
//! raw sample; every `samples_per_avg` ticks the window that just completed is
//! averaged into the average ring.
//!
//! ## Window boundaries
//!
//! Whether a tick closes a window is decided from the lifetime tick count, a
//! `u64` that never wraps, rather than from the wrapped cursor. Because the raw
//! ring holds a whole number of windows ([`RingGeometry`] guarantees it), the
//! two agree modulo `samples_per_avg`, and windows keep landing on the same
//! raw positions after every wrap.
//!
//! ## Memory
//!
//! With the default geometry the raw ring is 4320 × 20 bytes ≈ 84 KB and the
//! average ring 72 × 20 bytes, both allocated once in [`Aggregator::new`].

extern crate alloc;
use alloc::vec::Vec;

use log::debug;

use crate::clock::Clock;
use crate::config::RingGeometry;
use crate::events::LoggerEvent;
use crate::reader::VoltageReader;
use crate::ring::SampleRing;
use crate::sample::{AveragedSample, CHANNELS, Sample};

/// Result of one tick, for callers that forward it to observers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Raw ring position the sample was written to
    pub raw_index: usize,
    /// The sample recorded this tick
    pub sample: Sample,
    /// Average ring slot and value, when this tick completed a window
    pub average: Option<(usize, AveragedSample)>,
}

impl TickOutcome {
    /// Events describing this tick, raw sample first
    pub fn events(&self) -> impl Iterator<Item = LoggerEvent> + use<> {
        let sampled = LoggerEvent::Sampled {
            index: self.raw_index,
            sample: self.sample,
        };
        let averaged = self
            .average
            .map(|(slot, average)| LoggerEvent::Averaged { slot, average });
        core::iter::once(sampled).chain(averaged)
    }
}

/// Positions of the newest entries in each ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatestIndices {
    /// Most recently written raw slot, `None` before the first tick
    pub raw: Option<usize>,
    /// Most recently completed average slot, `None` until a window completes
    pub average: Option<usize>,
}

/// Fixed-memory sampling engine
///
/// `on_tick` takes `&mut self` and every accessor `&self`, so a tick always
/// runs to completion before anything can observe the rings.
pub struct Aggregator {
    geometry: RingGeometry,
    raw: SampleRing<Sample>,
    averages: SampleRing<AveragedSample>,
    /// Next raw slot to write
    cursor: usize,
    /// Samples recorded since construction
    ticks: u64,
}

impl Aggregator {
    /// Allocate both rings for `geometry`, filled with empty sentinels
    pub fn new(geometry: RingGeometry) -> Self {
        debug!(
            "Allocating rings: {} raw samples, {} per window, {} averages",
            geometry.total_samples(),
            geometry.samples_per_avg(),
            geometry.average_slots()
        );

        Self {
            geometry,
            raw: SampleRing::new(geometry.total_samples(), Sample::EMPTY),
            averages: SampleRing::new(geometry.average_slots(), AveragedSample::EMPTY),
            cursor: 0,
            ticks: 0,
        }
    }

    pub fn geometry(&self) -> RingGeometry {
        self.geometry
    }

    /// Next raw slot to be written, in `[0, total_samples)`
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total samples recorded
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Total averaging windows completed
    pub fn windows_completed(&self) -> u64 {
        self.ticks / self.geometry.samples_per_avg() as u64
    }

    /// Take one sample: read the voltages and the time, then record them
    pub fn on_tick<R, C>(&mut self, reader: &mut R, clock: &C) -> TickOutcome
    where
        R: VoltageReader + ?Sized,
        C: Clock + ?Sized,
    {
        let voltages = reader.read_channel_voltages();
        let timestamp = clock.now();
        self.record(Sample::new(timestamp, voltages))
    }

    /// Append a sample at the cursor, average the window if it just completed,
    /// and advance the cursor
    pub fn record(&mut self, sample: Sample) -> TickOutcome {
        let samples_per_avg = self.geometry.samples_per_avg() as u64;
        let raw_index = self.cursor;

        self.raw.write(raw_index, sample);
        self.ticks += 1;

        // The wrapped cursor and the lifetime count agree on window position.
        debug_assert_eq!(
            (raw_index as u64 + 1) % samples_per_avg,
            self.ticks % samples_per_avg
        );

        let average = if self.ticks >= samples_per_avg && self.ticks % samples_per_avg == 0 {
            let window = self.ticks / samples_per_avg - 1;
            let slot = (window % self.averages.capacity() as u64) as usize;
            let average = self.average_ending_at(raw_index, sample.timestamp);
            self.averages.write(slot, average);

            debug!("Window {} -> slot {}: {}", window, slot, average);
            Some((slot, average))
        } else {
            None
        };

        self.cursor = self.raw.ring_index(self.cursor, 1);

        TickOutcome {
            raw_index,
            sample,
            average,
        }
    }

    /// Mean of the `samples_per_avg` raw samples ending at `last_index`
    fn average_ending_at(&self, last_index: usize, timestamp: u32) -> AveragedSample {
        let count = self.geometry.samples_per_avg();
        let start = self.raw.ring_index(last_index + 1, -(count as isize));

        let mut sums = [0.0f32; CHANNELS];
        for sample in self.raw.iter_from(start, count) {
            for (sum, voltage) in sums.iter_mut().zip(sample.voltages) {
                *sum += voltage;
            }
        }

        AveragedSample::from_sums(timestamp, &sums, count)
    }

    /// Newest raw slot and newest average slot
    pub fn latest_indices(&self) -> LatestIndices {
        let raw = (self.ticks > 0).then(|| self.raw.ring_index(self.cursor, -1));
        let windows = self.windows_completed();
        let average =
            (windows > 0).then(|| ((windows - 1) % self.averages.capacity() as u64) as usize);

        LatestIndices { raw, average }
    }

    /// Most recent raw sample, `None` before the first tick
    pub fn latest_raw_sample(&self) -> Option<Sample> {
        self.latest_indices().raw.map(|index| self.raw.read(index))
    }

    /// Most recent window average, `None` until the first window completes
    pub fn latest_average(&self) -> Option<AveragedSample> {
        self.latest_indices()
            .average
            .map(|slot| self.averages.read(slot))
    }

    /// Number of raw slots holding real samples
    pub fn raw_len(&self) -> usize {
        self.ticks.min(self.raw.capacity() as u64) as usize
    }

    /// Number of average slots holding real averages
    pub fn average_len(&self) -> usize {
        self.windows_completed()
            .min(self.averages.capacity() as u64) as usize
    }

    /// The `n` most recent raw samples, oldest first
    ///
    /// `n` is clamped to [`Aggregator::raw_len`].
    pub fn raw_history(&self, n: usize) -> Vec<Sample> {
        let n = n.min(self.raw_len());
        let start = self.raw.ring_index(self.cursor, -(n as isize));
        self.raw.iter_from(start, n).collect()
    }

    /// The `n` most recent averages, oldest first
    ///
    /// `n` is clamped to [`Aggregator::average_len`].
    pub fn average_history(&self, n: usize) -> Vec<AveragedSample> {
        let n = n.min(self.average_len());
        let Some(newest) = self.latest_indices().average else {
            return Vec::new();
        };
        let start = self.averages.ring_index(newest + 1, -(n as isize));
        self.averages.iter_from(start, n).collect()
    }
}
