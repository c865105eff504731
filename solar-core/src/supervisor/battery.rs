//! Battery sampling and protection thresholds.

/// Charge path opens (switch off) above this voltage; the pack is full.
pub const CHARGE_OFF_ABOVE_MV: i16 = 12_300;
/// Charge path closes (switch on) below this voltage.
pub const CHARGE_ON_BELOW_MV: i16 = 12_200;
/// Load is inhibited below this voltage; the pack is considered empty.
pub const LOAD_INHIBIT_BELOW_MV: i16 = 9_300;
/// Load inhibition releases above this voltage.
pub const LOAD_RELEASE_ABOVE_MV: i16 = 9_600;

/// Analog channels the supervisor alternates between, one conversion per
/// second, so each value refreshes every two seconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AdcChannel {
    Voltage,
    Temperature,
}

/// Platform hook performing one blocking analog conversion.
///
/// The conversion latency is bounded by the converter hardware (on the order
/// of 200 µs) and is the only place the foreground loop blocks. Returns
/// millivolts for [`AdcChannel::Voltage`] and degrees Celsius for
/// [`AdcChannel::Temperature`]; scaling from raw counts is the platform's
/// business.
pub trait BatterySampler {
    fn sample(&mut self, channel: AdcChannel) -> i16;
}

/// Most recent conversion results.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BatteryReading {
    pub voltage_mv: i16,
    pub temperature_c: i16,
}

impl BatteryReading {
    /// Reading before any conversion has completed.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            voltage_mv: 0,
            temperature_c: 0,
        }
    }
}

/// Alternating-channel sampler state plus the protection comparators.
#[derive(Clone, Debug)]
pub struct BatteryMonitor {
    reading: BatteryReading,
    next_channel: AdcChannel,
}

impl BatteryMonitor {
    /// Monitor that will sample the battery voltage first.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reading: BatteryReading::zero(),
            next_channel: AdcChannel::Voltage,
        }
    }

    /// Latest readings; one of the two fields may be up to two seconds old.
    #[must_use]
    pub const fn reading(&self) -> BatteryReading {
        self.reading
    }

    /// Runs this second's conversion and returns the channel that was
    /// refreshed. The other channel is up next.
    pub fn sample(&mut self, sampler: &mut impl BatterySampler) -> AdcChannel {
        let channel = self.next_channel;
        match channel {
            AdcChannel::Voltage => {
                self.reading.voltage_mv = sampler.sample(channel);
                self.next_channel = AdcChannel::Temperature;
            }
            AdcChannel::Temperature => {
                self.reading.temperature_c = sampler.sample(channel);
                self.next_channel = AdcChannel::Voltage;
            }
        }
        channel
    }

    /// Charge-path verdict with hysteresis: `Some(false)` above the full
    /// threshold, `Some(true)` below the resume threshold, `None` inside the
    /// dead band (hold the previous state).
    #[must_use]
    pub const fn charge_decision(&self) -> Option<bool> {
        if self.reading.voltage_mv > CHARGE_OFF_ABOVE_MV {
            Some(false)
        } else if self.reading.voltage_mv < CHARGE_ON_BELOW_MV {
            Some(true)
        } else {
            None
        }
    }

    /// Returns `true` when the pack is too empty to carry the load.
    #[must_use]
    pub const fn is_low(&self) -> bool {
        self.reading.voltage_mv < LOAD_INHIBIT_BELOW_MV
    }

    /// Returns `true` when the pack has recovered enough to release the
    /// load inhibition.
    #[must_use]
    pub const fn has_recovered(&self) -> bool {
        self.reading.voltage_mv > LOAD_RELEASE_ABOVE_MV
    }
}

impl Default for BatteryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSampler {
        voltage_mv: i16,
        temperature_c: i16,
    }

    impl BatterySampler for FixedSampler {
        fn sample(&mut self, channel: AdcChannel) -> i16 {
            match channel {
                AdcChannel::Voltage => self.voltage_mv,
                AdcChannel::Temperature => self.temperature_c,
            }
        }
    }

    #[test]
    fn channels_alternate_starting_with_voltage() {
        let mut monitor = BatteryMonitor::new();
        let mut sampler = FixedSampler {
            voltage_mv: 12_100,
            temperature_c: 21,
        };
        assert_eq!(monitor.sample(&mut sampler), AdcChannel::Voltage);
        assert_eq!(monitor.reading().voltage_mv, 12_100);
        assert_eq!(monitor.reading().temperature_c, 0);
        assert_eq!(monitor.sample(&mut sampler), AdcChannel::Temperature);
        assert_eq!(monitor.reading().temperature_c, 21);
        assert_eq!(monitor.sample(&mut sampler), AdcChannel::Voltage);
    }

    #[test]
    fn charge_decision_has_a_dead_band() {
        let mut monitor = BatteryMonitor::new();
        monitor.reading.voltage_mv = 12_301;
        assert_eq!(monitor.charge_decision(), Some(false));
        monitor.reading.voltage_mv = 12_300;
        assert_eq!(monitor.charge_decision(), None);
        monitor.reading.voltage_mv = 12_250;
        assert_eq!(monitor.charge_decision(), None);
        monitor.reading.voltage_mv = 12_200;
        assert_eq!(monitor.charge_decision(), None);
        monitor.reading.voltage_mv = 12_199;
        assert_eq!(monitor.charge_decision(), Some(true));
    }

    #[test]
    fn low_battery_thresholds_leave_a_recovery_gap() {
        let mut monitor = BatteryMonitor::new();
        monitor.reading.voltage_mv = 9_299;
        assert!(monitor.is_low());
        assert!(!monitor.has_recovered());
        monitor.reading.voltage_mv = 9_450;
        assert!(!monitor.is_low());
        assert!(!monitor.has_recovered());
        monitor.reading.voltage_mv = 9_601;
        assert!(monitor.has_recovered());
    }
}
