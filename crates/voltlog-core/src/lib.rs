//! Hardware-independent core library for voltlog
//!
//! This crate contains the platform-agnostic part of the four-channel voltage
//! logger: the sample data model, the fixed-capacity rings, the aggregation
//! engine that folds raw samples into windowed averages, configuration, the
//! ADC noise-averaging reader and the wall clock used to stamp samples.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod reader;
pub mod ring;
pub mod sample;

pub use clock::{Clock, SyncedClock, UNSET_TIMESTAMP};
pub use config::{Config, ConfigError, ConfigResult, MAX_TOTAL_SAMPLES, RingGeometry};
pub use engine::{Aggregator, LatestIndices, TickOutcome};
pub use reader::{AdcChannel, NoiseAveragingReader, VoltageReader};
pub use ring::SampleRing;
pub use sample::{AveragedSample, CHANNELS, Channel, Sample};
