//! Board wiring: power switches, status LED, and the analog front-end.
//!
//! This module keeps every pin polarity and calibration constant in one
//! place and adapts the Embassy drivers onto the `solar-core` hardware
//! seams ([`SwitchBank`], [`BatterySampler`]).

#![cfg(target_os = "none")]

use defmt::info;
use embassy_stm32::Peri;
use embassy_stm32::adc::{Adc, SampleTime, Temperature};
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{ADC1, PA0};
use solar_core::supervisor::{AdcChannel, BatterySampler, SwitchBank};

/// Millivolts per ADC count through the battery sense divider, times 100.
const BATTERY_MV_PER_COUNT_X100: u32 = 1_514;

/// Raw offset of the internal temperature sensor at 0 °C.
const TEMPERATURE_ZERO_OFFSET: i32 = 264;

/// Charge-path switch, load switch, and the (active-low) status LED.
pub struct Switches<'d> {
    charge: Output<'d>,
    load: Output<'d>,
    status_led: Output<'d>,
}

impl<'d> Switches<'d> {
    /// Wraps the three outputs; callers hand them over already in their
    /// power-on (everything off) state.
    pub fn new(charge: Output<'d>, load: Output<'d>, status_led: Output<'d>) -> Self {
        Self {
            charge,
            load,
            status_led,
        }
    }
}

impl SwitchBank for Switches<'_> {
    fn set_charge(&mut self, enabled: bool) {
        if enabled != self.charge.is_set_high() {
            info!("charge path {}", if enabled { "on" } else { "off" });
        }
        if enabled {
            self.charge.set_high();
        } else {
            self.charge.set_low();
        }
    }

    fn set_load(&mut self, enabled: bool) {
        if enabled != self.load.is_set_high() {
            info!("load {}", if enabled { "on" } else { "off" });
        }
        if enabled {
            self.load.set_high();
        } else {
            self.load.set_low();
        }
    }

    fn set_status_led(&mut self, lit: bool) {
        // LED is wired active low.
        if lit {
            self.status_led.set_low();
        } else {
            self.status_led.set_high();
        }
    }
}

/// ADC wrapper alternating between the battery divider and the internal
/// temperature sensor.
pub struct BatteryAdc<'d> {
    adc: Adc<'d, ADC1>,
    battery_pin: Peri<'d, PA0>,
    temperature: Temperature,
}

impl<'d> BatteryAdc<'d> {
    /// Configures the converter and enables the internal temperature sensor.
    pub fn new(mut adc: Adc<'d, ADC1>, battery_pin: Peri<'d, PA0>) -> Self {
        adc.set_sample_time(SampleTime::CYCLES160_5);
        let temperature = adc.enable_temperature();
        Self {
            adc,
            battery_pin,
            temperature,
        }
    }
}

impl BatterySampler for BatteryAdc<'_> {
    fn sample(&mut self, channel: AdcChannel) -> i16 {
        match channel {
            AdcChannel::Voltage => {
                let raw = u32::from(self.adc.blocking_read(&mut self.battery_pin));
                let millivolts = raw * BATTERY_MV_PER_COUNT_X100 / 100;
                millivolts.try_into().unwrap_or(i16::MAX)
            }
            AdcChannel::Temperature => {
                let raw = i32::from(self.adc.blocking_read(&mut self.temperature));
                let celsius = raw - TEMPERATURE_ZERO_OFFSET;
                celsius.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
            }
        }
    }
}
