//! Logger configuration and ring geometry.
//!
//! Defaults reproduce the stock device: a sample every 10 seconds, 10-minute
//! averages and 12 hours of retention, which gives a 4320-slot raw ring and a
//! 72-slot average ring.

extern crate alloc;
use alloc::vec::Vec;

use embassy_time::Duration;
use log::error;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Largest raw ring the engine will allocate
///
/// 65536 samples × 20 bytes ≈ 1.3 MB, which still fits the device's PSRAM.
pub const MAX_TOTAL_SAMPLES: usize = 65_536;

/// Error types for configuration validation and decoding
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A sampling parameter is zero
    #[error("Sampling parameter must be non-zero: {field}")]
    Zero {
        /// Name of the offending field
        field: &'static str,
    },

    /// Averaging window is not a whole number of sampling intervals
    #[error("Average interval ({average_secs}s) is not a multiple of the sample interval ({sample_secs}s)")]
    WindowNotAligned {
        average_secs: u32,
        sample_secs: u32,
    },

    /// Retention is not a whole number of averaging windows
    ///
    /// The raw ring must hold an exact number of windows, otherwise window
    /// boundaries would not line up with ring positions after a wrap.
    #[error("Retention ({retention_secs}s) is not a multiple of the average interval ({average_secs}s)")]
    RetentionNotAligned {
        retention_secs: u32,
        average_secs: u32,
    },

    /// A sampling parameter is too large to convert to seconds
    #[error("Sampling parameter overflows when converted to seconds: {field}")]
    Overflow {
        /// Name of the offending field
        field: &'static str,
    },

    /// Raw ring would exceed [`MAX_TOTAL_SAMPLES`]
    #[error("Raw ring of {total_samples} samples exceeds the maximum of {max}")]
    RingTooLarge {
        total_samples: u32,
        /// Maximum allowed raw ring capacity
        max: usize,
    },

    /// ADC calibration would divide by zero or is not a finite number
    #[error("Invalid ADC calibration: {param}")]
    InvalidCalibration {
        /// Parameter description
        param: &'static str,
    },

    /// Stored configuration blob could not be decoded or encoded
    #[error("Configuration encoding error")]
    Encoding,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete logger configuration
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub adc: AdcConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// Decode a configuration blob (postcard format)
    pub fn from_bytes(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = postcard::from_bytes(bytes).map_err(|e| {
            error!("Failed to decode configuration: {:?}", e);
            ConfigError::Encoding
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Encode this configuration as a postcard blob
    pub fn to_vec(&self) -> ConfigResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| {
            error!("Failed to encode configuration: {:?}", e);
            ConfigError::Encoding
        })
    }

    /// Check every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.sampling.geometry()?;
        self.adc.validate()
    }
}

/// Sampling cadence and retention
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Seconds between raw samples
    pub sample_interval_secs: u32,
    /// Minutes per averaging window
    pub average_interval_min: u32,
    /// Hours of history held by the rings
    pub total_hours: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 10,
            average_interval_min: 10,
            total_hours: 12,
        }
    }
}

impl SamplingConfig {
    /// Time between sampling ticks
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sample_interval_secs))
    }

    /// Width of one averaging window
    pub fn average_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.average_interval_min) * 60)
    }

    /// Derive the ring sizes, rejecting cadences whose windows would not tile
    /// the raw ring exactly
    pub fn geometry(&self) -> ConfigResult<RingGeometry> {
        if self.sample_interval_secs == 0 {
            return Err(ConfigError::Zero {
                field: "sample_interval_secs",
            });
        }
        if self.average_interval_min == 0 {
            return Err(ConfigError::Zero {
                field: "average_interval_min",
            });
        }
        if self.total_hours == 0 {
            return Err(ConfigError::Zero {
                field: "total_hours",
            });
        }

        let sample_secs = self.sample_interval_secs;
        let average_secs = self
            .average_interval_min
            .checked_mul(60)
            .ok_or(ConfigError::Overflow {
                field: "average_interval_min",
            })?;
        let retention_secs = self
            .total_hours
            .checked_mul(3600)
            .ok_or(ConfigError::Overflow {
                field: "total_hours",
            })?;

        if average_secs % sample_secs != 0 {
            error!(
                "Average interval {}s does not divide into {}s samples",
                average_secs, sample_secs
            );
            return Err(ConfigError::WindowNotAligned {
                average_secs,
                sample_secs,
            });
        }
        if retention_secs % average_secs != 0 {
            error!(
                "Retention {}s does not divide into {}s windows",
                retention_secs, average_secs
            );
            return Err(ConfigError::RetentionNotAligned {
                retention_secs,
                average_secs,
            });
        }

        let total_samples = retention_secs / sample_secs;
        if total_samples as usize > MAX_TOTAL_SAMPLES {
            error!(
                "Raw ring of {} samples exceeds the maximum of {}",
                total_samples, MAX_TOTAL_SAMPLES
            );
            return Err(ConfigError::RingTooLarge {
                total_samples,
                max: MAX_TOTAL_SAMPLES,
            });
        }

        Ok(RingGeometry {
            total_samples: total_samples as usize,
            samples_per_avg: (average_secs / sample_secs) as usize,
            average_slots: (retention_secs / average_secs) as usize,
        })
    }
}

/// Sizes of the two rings
///
/// Only obtainable through [`SamplingConfig::geometry`] (or the default), so
/// `total_samples` is always an exact non-zero multiple of `samples_per_avg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGeometry {
    total_samples: usize,
    samples_per_avg: usize,
    average_slots: usize,
}

impl RingGeometry {
    /// Raw ring capacity
    pub const fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Raw samples per averaging window
    pub const fn samples_per_avg(&self) -> usize {
        self.samples_per_avg
    }

    /// Average ring capacity
    pub const fn average_slots(&self) -> usize {
        self.average_slots
    }
}

impl Default for RingGeometry {
    fn default() -> Self {
        // 12 h at 10 s samples and 10 min windows.
        Self {
            total_samples: 4320,
            samples_per_avg: 60,
            average_slots: 72,
        }
    }
}

/// ADC front-end calibration
///
/// Each input goes through a resistive divider (`divider_high_ohms` on top,
/// `divider_low_ohms` to ground) before reaching the ADC pin.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AdcConfig {
    pub divider_high_ohms: f32,
    pub divider_low_ohms: f32,
    /// ADC reference voltage at full scale
    pub reference_volts: f32,
    /// Conversion count at full scale
    pub full_scale: u16,
    /// Conversions averaged per channel per sample
    pub reads_per_sample: u16,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            divider_high_ohms: 100_000.0,
            divider_low_ohms: 15_000.0,
            reference_volts: 3.3,
            full_scale: 4095,
            reads_per_sample: 10,
        }
    }
}

impl AdcConfig {
    /// Ratio between the measured input and the voltage at the ADC pin
    pub fn divider_ratio(&self) -> f32 {
        (self.divider_high_ohms + self.divider_low_ohms) / self.divider_low_ohms
    }

    /// Convert a (possibly fractional) conversion count to input volts
    pub fn counts_to_volts(&self, counts: f32) -> f32 {
        counts / f32::from(self.full_scale) * self.reference_volts * self.divider_ratio()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.full_scale == 0 {
            return Err(ConfigError::InvalidCalibration {
                param: "full_scale must be non-zero",
            });
        }
        // Written negated so NaN is rejected too.
        if !(self.divider_low_ohms > 0.0 && self.divider_low_ohms.is_finite()) {
            return Err(ConfigError::InvalidCalibration {
                param: "divider_low_ohms must be positive",
            });
        }
        if !(self.divider_high_ohms >= 0.0 && self.divider_high_ohms.is_finite()) {
            return Err(ConfigError::InvalidCalibration {
                param: "divider_high_ohms must be non-negative",
            });
        }
        if !(self.reference_volts > 0.0 && self.reference_volts.is_finite()) {
            return Err(ConfigError::InvalidCalibration {
                param: "reference_volts must be positive",
            });
        }
        if self.reads_per_sample == 0 {
            return Err(ConfigError::InvalidCalibration {
                param: "reads_per_sample must be non-zero",
            });
        }
        Ok(())
    }
}

/// Settings for whatever renders the stored history
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Number of points requested for a graph
    pub graph_points: usize,
    /// How often a rendered view refreshes, in milliseconds
    pub refresh_interval_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            graph_points: 30,
            refresh_interval_ms: 60_000,
        }
    }
}

impl DisplayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.refresh_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let geometry = SamplingConfig::default().geometry().unwrap();
        assert_eq!(geometry, RingGeometry::default());
        assert_eq!(geometry.total_samples(), 4320);
        assert_eq!(geometry.samples_per_avg(), 60);
        assert_eq!(geometry.average_slots(), 72);
    }

    #[test]
    fn test_geometry_for_other_cadence() {
        let sampling = SamplingConfig {
            sample_interval_secs: 30,
            average_interval_min: 15,
            total_hours: 24,
        };
        let geometry = sampling.geometry().unwrap();
        assert_eq!(geometry.total_samples(), 2880);
        assert_eq!(geometry.samples_per_avg(), 30);
        assert_eq!(geometry.average_slots(), 96);
        assert_eq!(geometry.total_samples() % geometry.samples_per_avg(), 0);
    }

    #[test]
    fn test_rejects_zero_fields() {
        let sampling = SamplingConfig {
            sample_interval_secs: 0,
            ..SamplingConfig::default()
        };
        assert_eq!(
            sampling.geometry(),
            Err(ConfigError::Zero {
                field: "sample_interval_secs"
            })
        );
    }

    #[test]
    fn test_rejects_misaligned_window() {
        let sampling = SamplingConfig {
            sample_interval_secs: 7,
            ..SamplingConfig::default()
        };
        assert_eq!(
            sampling.geometry(),
            Err(ConfigError::WindowNotAligned {
                average_secs: 600,
                sample_secs: 7
            })
        );
    }

    #[test]
    fn test_rejects_misaligned_retention() {
        let sampling = SamplingConfig {
            average_interval_min: 25,
            total_hours: 1,
            ..SamplingConfig::default()
        };
        assert_eq!(
            sampling.geometry(),
            Err(ConfigError::RetentionNotAligned {
                retention_secs: 3600,
                average_secs: 1500
            })
        );
    }

    #[test]
    fn test_rejects_overflowing_retention() {
        let sampling = SamplingConfig {
            total_hours: 2_000_000,
            ..SamplingConfig::default()
        };
        assert_eq!(
            sampling.geometry(),
            Err(ConfigError::Overflow {
                field: "total_hours"
            })
        );

        let sampling = SamplingConfig {
            average_interval_min: u32::MAX,
            ..SamplingConfig::default()
        };
        assert_eq!(
            sampling.geometry(),
            Err(ConfigError::Overflow {
                field: "average_interval_min"
            })
        );
    }

    #[test]
    fn test_rejects_oversized_ring() {
        let sampling = SamplingConfig {
            total_hours: 1_000_000,
            ..SamplingConfig::default()
        };
        assert_eq!(
            sampling.geometry(),
            Err(ConfigError::RingTooLarge {
                total_samples: 360_000_000,
                max: MAX_TOTAL_SAMPLES
            })
        );

        // Largest whole-hour retention at 10 s samples that still fits.
        let sampling = SamplingConfig {
            total_hours: 182,
            ..SamplingConfig::default()
        };
        let geometry = sampling.geometry().unwrap();
        assert!(geometry.total_samples() <= MAX_TOTAL_SAMPLES);
    }

    #[test]
    fn test_oversized_blob_is_rejected() {
        let mut config = Config::default();
        config.sampling.total_hours = 1_000_000;
        let bytes = config.to_vec().unwrap();
        assert!(matches!(
            Config::from_bytes(&bytes),
            Err(ConfigError::RingTooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite_calibration() {
        for adc in [
            AdcConfig {
                divider_low_ohms: f32::NAN,
                ..AdcConfig::default()
            },
            AdcConfig {
                divider_high_ohms: f32::INFINITY,
                ..AdcConfig::default()
            },
            AdcConfig {
                reference_volts: f32::NAN,
                ..AdcConfig::default()
            },
            AdcConfig {
                reference_volts: 0.0,
                ..AdcConfig::default()
            },
        ] {
            assert!(
                matches!(adc.validate(), Err(ConfigError::InvalidCalibration { .. })),
                "accepted {adc:?}"
            );
        }
    }

    #[test]
    fn test_intervals() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.sample_interval(), Duration::from_secs(10));
        assert_eq!(sampling.average_interval(), Duration::from_secs(600));
        assert_eq!(
            DisplayConfig::default().refresh_interval(),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_adc_validation() {
        assert!(AdcConfig::default().validate().is_ok());
        let adc = AdcConfig {
            reads_per_sample: 0,
            ..AdcConfig::default()
        };
        assert!(matches!(
            adc.validate(),
            Err(ConfigError::InvalidCalibration { .. })
        ));
    }

    #[test]
    fn test_config_blob() {
        let mut config = Config::default();
        config.sampling.total_hours = 24;
        config.display.graph_points = 60;

        let bytes = config.to_vec().unwrap();
        let decoded = Config::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, config);

        assert_eq!(Config::from_bytes(&[0xff]), Err(ConfigError::Encoding));
    }

    #[test]
    fn test_config_blob_is_validated() {
        let mut config = Config::default();
        config.sampling.sample_interval_secs = 7;
        let bytes = config.to_vec().unwrap();
        assert!(matches!(
            Config::from_bytes(&bytes),
            Err(ConfigError::WindowNotAligned { .. })
        ));
    }
}
