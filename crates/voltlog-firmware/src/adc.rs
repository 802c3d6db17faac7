//! ADC1 front end for the four divider inputs

use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO4, GPIO5, GPIO6, GPIO7};
use log::error;

use voltlog_core::{AdcChannel, Channel};

/// The four logger inputs on ADC1, 11 dB attenuation (0 to ~3.1 V at the pin)
///
/// | Channel | Pin    |
/// |---------|--------|
/// | V1      | GPIO4  |
/// | V2      | GPIO5  |
/// | V3      | GPIO6  |
/// | V4      | GPIO7  |
pub struct EspAdc<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    v1: AdcPin<GPIO4<'d>, ADC1<'d>>,
    v2: AdcPin<GPIO5<'d>, ADC1<'d>>,
    v3: AdcPin<GPIO6<'d>, ADC1<'d>>,
    v4: AdcPin<GPIO7<'d>, ADC1<'d>>,
}

impl<'d> EspAdc<'d> {
    pub fn new(
        adc1: ADC1<'d>,
        v1: GPIO4<'d>,
        v2: GPIO5<'d>,
        v3: GPIO6<'d>,
        v4: GPIO7<'d>,
    ) -> Self {
        let mut config = AdcConfig::new();
        let v1 = config.enable_pin(v1, Attenuation::_11dB);
        let v2 = config.enable_pin(v2, Attenuation::_11dB);
        let v3 = config.enable_pin(v3, Attenuation::_11dB);
        let v4 = config.enable_pin(v4, Attenuation::_11dB);

        Self {
            adc: Adc::new(adc1, config),
            v1,
            v2,
            v3,
            v4,
        }
    }
}

impl AdcChannel for EspAdc<'_> {
    fn read_raw(&mut self, channel: Channel) -> u16 {
        let result = match channel {
            Channel::V1 => nb::block!(self.adc.read_oneshot(&mut self.v1)),
            Channel::V2 => nb::block!(self.adc.read_oneshot(&mut self.v2)),
            Channel::V3 => nb::block!(self.adc.read_oneshot(&mut self.v3)),
            Channel::V4 => nb::block!(self.adc.read_oneshot(&mut self.v4)),
        };

        result.unwrap_or_else(|e| {
            error!("ADC conversion on {} failed: {:?}", channel.label(), e);
            0
        })
    }
}
