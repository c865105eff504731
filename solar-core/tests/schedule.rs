use solar_core::clock::TICKS_PER_SECOND;
use solar_core::controller::Controller;
use solar_core::supervisor::{AdcChannel, BatterySampler, SwitchBank};

struct AdjustableSampler {
    voltage_mv: i16,
    temperature_c: i16,
}

impl BatterySampler for AdjustableSampler {
    fn sample(&mut self, channel: AdcChannel) -> i16 {
        match channel {
            AdcChannel::Voltage => self.voltage_mv,
            AdcChannel::Temperature => self.temperature_c,
        }
    }
}

#[derive(Default)]
struct RecordingSwitches {
    charge: bool,
    load: bool,
    led: bool,
}

impl SwitchBank for RecordingSwitches {
    fn set_charge(&mut self, enabled: bool) {
        self.charge = enabled;
    }

    fn set_load(&mut self, enabled: bool) {
        self.load = enabled;
    }

    fn set_status_led(&mut self, lit: bool) {
        self.led = lit;
    }
}

struct Bench {
    controller: Controller,
    sampler: AdjustableSampler,
    switches: RecordingSwitches,
}

impl Bench {
    fn new() -> Self {
        Self {
            controller: Controller::new(),
            sampler: AdjustableSampler {
                voltage_mv: 12_500,
                temperature_c: 18,
            },
            switches: RecordingSwitches::default(),
        }
    }

    fn advance_seconds(&mut self, seconds: u32) {
        for _ in 0..seconds {
            for _ in 0..TICKS_PER_SECOND {
                self.controller.tick();
            }
            self.controller.poll(&mut self.sampler, &mut self.switches);
        }
    }

    fn send_line(&mut self, line: &str) {
        for byte in line.bytes() {
            self.controller.receive_byte(byte);
        }
        self.controller.receive_byte(b'\r');
        self.controller.poll(&mut self.sampler, &mut self.switches);
    }

    fn load_enabled(&self) -> bool {
        self.controller.supervisor().power().load_enabled()
    }

    fn charge_enabled(&self) -> bool {
        self.controller.supervisor().power().charge_enabled()
    }
}

#[test]
fn startup_grace_energizes_the_load_once() {
    let mut bench = Bench::new();
    bench.advance_seconds(4);
    assert!(!bench.load_enabled());
    bench.advance_seconds(1);
    assert!(bench.load_enabled());
    assert!(bench.switches.load);
}

#[test]
fn load_switches_at_the_configured_trigger_points() {
    let mut bench = Bench::new();

    bench.advance_seconds(1);
    bench.send_line("T1959");
    bench.advance_seconds(59);
    assert_eq!(bench.controller.clock().hour, 20);
    assert!(bench.load_enabled());
    // A schedule start re-arms the watchdog and expects a fresh time-set.
    assert!(!bench.controller.supervisor().power().liveness_confirmed());
    assert_eq!(
        bench.controller.supervisor().recovery().retries_remaining(),
        3
    );

    bench.send_line("T2259");
    bench.advance_seconds(60);
    assert_eq!(bench.controller.clock().hour, 23);
    assert!(!bench.load_enabled());
}

#[test]
fn stop_before_start_acts_as_two_independent_triggers() {
    let mut bench = Bench::new();
    bench.send_line("A1000");
    bench.send_line("S0900");
    bench.send_line("T0859");

    bench.advance_seconds(60);
    assert_eq!(bench.controller.clock().hour, 9);
    assert!(!bench.load_enabled());

    bench.advance_seconds(3600);
    assert_eq!(bench.controller.clock().hour, 10);
    assert!(bench.load_enabled());
}

#[test]
fn charge_path_hysteresis_holds_inside_the_dead_band() {
    let mut bench = Bench::new();

    bench.sampler.voltage_mv = 12_100;
    bench.advance_seconds(2);
    assert!(bench.charge_enabled());
    assert!(bench.switches.charge, "pin must mirror the supervisor state");

    bench.sampler.voltage_mv = 12_250;
    bench.advance_seconds(4);
    assert!(bench.charge_enabled(), "dead band must hold the last state");

    bench.sampler.voltage_mv = 12_301;
    bench.advance_seconds(2);
    assert!(!bench.charge_enabled());

    bench.sampler.voltage_mv = 12_250;
    bench.advance_seconds(4);
    assert!(!bench.charge_enabled(), "dead band must hold the last state");

    bench.sampler.voltage_mv = 12_199;
    bench.advance_seconds(2);
    assert!(bench.charge_enabled());
}

#[test]
fn low_battery_inhibits_the_load_after_the_arm_delay() {
    let mut bench = Bench::new();
    bench.sampler.voltage_mv = 9_000;

    // Early readings are distrusted: the load still comes up on grace.
    bench.advance_seconds(5);
    assert!(bench.load_enabled());
    assert!(!bench.controller.supervisor().is_inhibited());

    // Ten seconds in, the same reading inhibits and drops the load.
    bench.advance_seconds(7);
    assert!(bench.controller.supervisor().is_inhibited());
    assert!(!bench.load_enabled());

    // Recovery above the release threshold lifts the inhibition but does
    // not re-energize anything; only a trigger or command does that.
    bench.sampler.voltage_mv = 9_700;
    bench.advance_seconds(2);
    assert!(!bench.controller.supervisor().is_inhibited());
    assert!(!bench.load_enabled());
}

#[test]
fn inhibition_blocks_the_scheduled_start() {
    let mut bench = Bench::new();
    bench.sampler.voltage_mv = 9_000;
    bench.send_line("A0001");
    bench.advance_seconds(15);
    assert!(bench.controller.supervisor().is_inhibited());

    bench.advance_seconds(45);
    assert_eq!(bench.controller.clock().minute, 1);
    assert!(!bench.load_enabled(), "inhibited start must not fire");
}

#[test]
fn status_led_blinks_until_the_first_time_set() {
    let mut bench = Bench::new();

    bench.advance_seconds(1);
    assert!(bench.switches.led, "voltage-phase second lights the LED");
    bench.advance_seconds(1);
    assert!(!bench.switches.led, "temperature-phase second darkens it");
    bench.advance_seconds(1);
    assert!(bench.switches.led);

    bench.send_line("T1200");
    bench.advance_seconds(2);
    assert!(!bench.switches.led);
    bench.advance_seconds(1);
    assert!(!bench.switches.led);
}
