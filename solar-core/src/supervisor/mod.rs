//! Power supervisor.
//!
//! Once per wall-clock second the supervisor refreshes one analog channel,
//! applies the schedule trigger points and the battery-protection rules to
//! the two power switches, and advances the liveness-watchdog escalation.
//! It owns every switch output; nothing else in the system writes them.

pub mod battery;
pub mod recovery;

pub use battery::{AdcChannel, BatteryMonitor, BatteryReading, BatterySampler};
pub use recovery::{LoadAction, Recovery, RecoveryState};

use crate::clock::{ClockSnapshot, TimeOfDay};

/// Seconds after power-up at which the load is first energized, before any
/// schedule trigger. The remote system comes up shortly after the
/// controller does.
pub const STARTUP_GRACE_SECONDS: u32 = 5;

/// Seconds after power-up before low-battery inhibition may engage; the
/// first conversions out of reset are unreliable.
pub const INHIBIT_ARM_DELAY_SECONDS: u32 = 10;

/// Daily trigger points for the load switch.
///
/// Start and stop are independent trigger points: no ordering is enforced
/// between them, and a stop "before" the start simply fires at its own time
/// of day. They are not an interval.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Schedule {
    pub start: TimeOfDay,
    pub stop: TimeOfDay,
}

impl Schedule {
    /// Boot defaults: load on at 20:00, off at 23:00.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start: TimeOfDay {
                hour: 20,
                minute: 0,
            },
            stop: TimeOfDay {
                hour: 23,
                minute: 0,
            },
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Switch outputs plus the liveness flag tied to them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PowerState {
    charge_enabled: bool,
    load_enabled: bool,
    liveness_confirmed: bool,
}

impl PowerState {
    /// Both switches open, liveness unconfirmed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            charge_enabled: false,
            load_enabled: false,
            liveness_confirmed: false,
        }
    }

    /// Charge-path switch state.
    #[must_use]
    pub const fn charge_enabled(&self) -> bool {
        self.charge_enabled
    }

    /// Load switch state.
    #[must_use]
    pub const fn load_enabled(&self) -> bool {
        self.load_enabled
    }

    /// Whether the operator has confirmed liveness since the load came up.
    #[must_use]
    pub const fn liveness_confirmed(&self) -> bool {
        self.liveness_confirmed
    }

    /// Marks liveness confirmed (successful time-set command).
    pub(crate) fn confirm_liveness(&mut self) {
        self.liveness_confirmed = true;
    }
}

impl Default for PowerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Physical switch and indicator outputs driven by the supervisor.
pub trait SwitchBank {
    fn set_charge(&mut self, enabled: bool);
    fn set_load(&mut self, enabled: bool);
    fn set_status_led(&mut self, lit: bool);
}

/// Switch bank that drives nothing; for host tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSwitchBank;

impl SwitchBank for NoopSwitchBank {
    fn set_charge(&mut self, _: bool) {}

    fn set_load(&mut self, _: bool) {}

    fn set_status_led(&mut self, _: bool) {}
}

/// Per-second policy engine for the two power switches.
#[derive(Clone, Debug)]
pub struct Supervisor {
    schedule: Schedule,
    power: PowerState,
    monitor: BatteryMonitor,
    recovery: Recovery,
    /// Low-battery load inhibition; overrides the schedule while set.
    inhibited: bool,
    uptime_seconds: u32,
}

impl Supervisor {
    /// Supervisor with boot defaults and both switches open.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            schedule: Schedule::new(),
            power: PowerState::new(),
            monitor: BatteryMonitor::new(),
            recovery: Recovery::new(),
            inhibited: false,
            uptime_seconds: 0,
        }
    }

    /// Current switch outputs and liveness flag.
    #[must_use]
    pub const fn power(&self) -> PowerState {
        self.power
    }

    /// Latest battery readings.
    #[must_use]
    pub const fn battery(&self) -> BatteryReading {
        self.monitor.reading()
    }

    /// Configured trigger points.
    #[must_use]
    pub const fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Escalation ladder state.
    #[must_use]
    pub const fn recovery(&self) -> &Recovery {
        &self.recovery
    }

    /// Returns `true` while low battery keeps the load forced off.
    #[must_use]
    pub const fn is_inhibited(&self) -> bool {
        self.inhibited
    }

    pub(crate) fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    pub(crate) fn power_mut(&mut self) -> &mut PowerState {
        &mut self.power
    }

    pub(crate) fn recovery_mut(&mut self) -> &mut Recovery {
        &mut self.recovery
    }

    /// Runs one second of policy: analog refresh, schedule trigger points,
    /// battery protection, escalation countdowns, liveness window.
    pub fn on_second(
        &mut self,
        now: ClockSnapshot,
        sampler: &mut impl BatterySampler,
        switches: &mut impl SwitchBank,
    ) {
        self.uptime_seconds = self.uptime_seconds.saturating_add(1);

        if self.uptime_seconds == STARTUP_GRACE_SECONDS {
            self.set_load(true, switches);
        }

        // One conversion per second; the status LED rides the same phase,
        // blinking at a 2 s period until the first time-set confirms the
        // operator is listening.
        match self.monitor.sample(sampler) {
            AdcChannel::Voltage => {
                switches.set_status_led(!self.power.liveness_confirmed);
            }
            AdcChannel::Temperature => switches.set_status_led(false),
        }

        self.apply_schedule(now, switches);
        self.apply_battery_protection(switches);

        match self.recovery.on_second() {
            Some(LoadAction::ForceOff) => self.set_load(false, switches),
            Some(LoadAction::ForceOn) => self.set_load(true, switches),
            None => {}
        }

        if now.second == 59 && !self.power.liveness_confirmed {
            self.recovery.liveness_missed();
        }
    }

    fn apply_schedule(&mut self, now: ClockSnapshot, switches: &mut impl SwitchBank) {
        if now.second != 0 {
            return;
        }
        if now.hour == self.schedule.start.hour
            && now.minute == self.schedule.start.minute
            && !self.inhibited
        {
            self.set_load(true, switches);
            self.power.liveness_confirmed = false;
            self.recovery.reset_retries();
        }
        if now.hour == self.schedule.stop.hour && now.minute == self.schedule.stop.minute {
            self.set_load(false, switches);
        }
    }

    fn apply_battery_protection(&mut self, switches: &mut impl SwitchBank) {
        if let Some(enabled) = self.monitor.charge_decision() {
            self.set_charge(enabled, switches);
        }

        if self.uptime_seconds >= INHIBIT_ARM_DELAY_SECONDS && self.monitor.is_low() {
            self.inhibited = true;
        }
        if self.monitor.has_recovered() {
            self.inhibited = false;
        }
        if self.inhibited && self.power.load_enabled {
            self.set_load(false, switches);
        }
    }

    fn set_load(&mut self, enabled: bool, switches: &mut impl SwitchBank) {
        self.power.load_enabled = enabled;
        switches.set_load(enabled);
    }

    fn set_charge(&mut self, enabled: bool, switches: &mut impl SwitchBank) {
        self.power.charge_enabled = enabled;
        switches.set_charge(enabled);
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
