//! ESP32-S3 firmware-specific modules for voltlog
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: the ADC front end behind the core's [`AdcChannel`] seam and the
//! status LED task.
//!
//! [`AdcChannel`]: voltlog_core::AdcChannel

#![no_std]

extern crate alloc;

pub mod adc;
pub mod status_led;
