use solar_core::clock::TICKS_PER_SECOND;
use solar_core::controller::Controller;
use solar_core::softuart::Level;
use solar_core::supervisor::{AdcChannel, BatterySampler, RecoveryState, SwitchBank};

/// Battery front-end whose readings the operator scripts with directives.
struct ScriptedBattery {
    voltage_mv: i16,
    temperature_c: i16,
}

impl BatterySampler for ScriptedBattery {
    fn sample(&mut self, channel: AdcChannel) -> i16 {
        match channel {
            AdcChannel::Voltage => self.voltage_mv,
            AdcChannel::Temperature => self.temperature_c,
        }
    }
}

/// Switch bank that records transitions as transcript lines.
#[derive(Default)]
struct LoggingSwitches {
    charge: bool,
    load: bool,
    led: bool,
    events: Vec<String>,
}

impl SwitchBank for LoggingSwitches {
    fn set_charge(&mut self, enabled: bool) {
        if enabled != self.charge {
            self.charge = enabled;
            self.events
                .push(format!("[charge {}]", if enabled { "on" } else { "off" }));
        }
    }

    fn set_load(&mut self, enabled: bool) {
        if enabled != self.load {
            self.load = enabled;
            self.events
                .push(format!("[load {}]", if enabled { "on" } else { "off" }));
        }
    }

    fn set_status_led(&mut self, lit: bool) {
        // The LED toggles every second until the clock is set; logging it
        // would drown the transcript.
        self.led = lit;
    }
}

/// Decodes the transmit waveform back into bytes, one drive level per bit
/// interval, exactly as a listening peer would.
#[derive(Default)]
struct WireProbe {
    frame: Option<(u8, u8)>,
}

impl WireProbe {
    fn sample(&mut self, drive: Option<Level>) -> Option<u8> {
        match self.frame {
            None => {
                if drive == Some(Level::Low) {
                    self.frame = Some((0, 0));
                }
                None
            }
            Some((data, bits)) if bits < 8 => {
                let mut data = data;
                if drive == Some(Level::High) {
                    data |= 1 << bits;
                }
                self.frame = Some((data, bits + 1));
                None
            }
            Some((data, _)) => {
                // Stop-bit interval: the frame is complete.
                self.frame = None;
                Some(data)
            }
        }
    }
}

/// One emulated controller plus the scripted world around it.
pub struct Session {
    controller: Controller,
    battery: ScriptedBattery,
    switches: LoggingSwitches,
    probe: WireProbe,
    reply_bytes: Vec<u8>,
    elapsed_seconds: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            controller: Controller::new(),
            battery: ScriptedBattery {
                voltage_mv: 12_500,
                temperature_c: 20,
            },
            switches: LoggingSwitches::default(),
            probe: WireProbe::default(),
            reply_bytes: Vec::new(),
            elapsed_seconds: 0,
        }
    }

    /// Handles one operator line: either an emulator directive (leading
    /// dot) or a serial command clocked through the controller.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        if let Some(directive) = line.strip_prefix('.') {
            return self.handle_directive(directive);
        }

        for byte in line.bytes() {
            self.controller.receive_byte(byte);
        }
        self.controller.receive_byte(b'\r');
        self.controller.poll(&mut self.battery, &mut self.switches);

        // Let the transmitter clock the reply out over the simulated wire.
        self.advance_seconds(1);
        self.collect_output()
    }

    fn handle_directive(&mut self, directive: &str) -> Vec<String> {
        let mut words = directive.split_whitespace();
        match (words.next(), words.next()) {
            (Some("tick"), count) => {
                let seconds = count.and_then(|value| value.parse().ok()).unwrap_or(1);
                self.advance_seconds(seconds);
                let mut output = self.collect_output();
                output.push(format!("[advanced {seconds}s]"));
                output
            }
            (Some("volts"), Some(value)) => match value.parse() {
                Ok(millivolts) => {
                    self.battery.voltage_mv = millivolts;
                    vec![format!("[battery {millivolts} mV]")]
                }
                Err(_) => vec!["[expected .volts <millivolts>]".to_string()],
            },
            (Some("temp"), Some(value)) => match value.parse() {
                Ok(celsius) => {
                    self.battery.temperature_c = celsius;
                    vec![format!("[temperature {celsius} C]")]
                }
                Err(_) => vec!["[expected .temp <celsius>]".to_string()],
            },
            (Some("status"), _) => self.render_status(),
            (Some("help"), _) => Self::render_help(),
            _ => vec![format!("[unknown directive `.{directive}`; try .help]")],
        }
    }

    /// Runs whole simulated seconds: 2400 bit-interval ticks with the wire
    /// probe listening, then one foreground iteration.
    fn advance_seconds(&mut self, seconds: u64) {
        for _ in 0..seconds {
            for _ in 0..TICKS_PER_SECOND {
                let drive = self.controller.tick();
                if let Some(byte) = self.probe.sample(drive) {
                    self.reply_bytes.push(byte);
                }
            }
            self.controller.poll(&mut self.battery, &mut self.switches);
        }
        self.elapsed_seconds += seconds;
    }

    /// Drains decoded reply lines and recorded switch transitions.
    fn collect_output(&mut self) -> Vec<String> {
        let mut output: Vec<String> = self.switches.events.drain(..).collect();
        let text = String::from_utf8_lossy(&self.reply_bytes).into_owned();
        self.reply_bytes.clear();
        output.extend(
            text.split("\r\n")
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
        output
    }

    fn render_status(&self) -> Vec<String> {
        let clock = self.controller.clock();
        let supervisor = self.controller.supervisor();
        let power = supervisor.power();
        let recovery = supervisor.recovery();
        let ladder = match recovery.state() {
            RecoveryState::Normal => "normal".to_string(),
            RecoveryState::Rebooting { remaining } => format!("rebooting ({remaining}s)"),
            RecoveryState::Killing { remaining } => format!("killing ({remaining}s)"),
        };
        vec![
            format!(
                "clock {:02}:{:02}:{:02}  uptime {}s",
                clock.hour, clock.minute, clock.second, self.elapsed_seconds
            ),
            format!(
                "schedule start {} stop {}",
                supervisor.schedule().start,
                supervisor.schedule().stop
            ),
            format!(
                "switches charge={} load={} led={}  liveness={}",
                u8::from(power.charge_enabled()),
                u8::from(power.load_enabled()),
                u8::from(self.switches.led),
                if power.liveness_confirmed() {
                    "confirmed"
                } else {
                    "pending"
                }
            ),
            format!(
                "watchdog {ladder}, {} retries left{}",
                recovery.retries_remaining(),
                if supervisor.is_inhibited() {
                    ", load inhibited (low battery)"
                } else {
                    ""
                }
            ),
        ]
    }

    fn render_help() -> Vec<String> {
        [
            "serial commands: H? B? T?/Thhmm A?/Ahhmm S?/Shhmm K? R?",
            ".tick [n]    advance n simulated seconds (default 1)",
            ".volts <mv>  set the scripted battery voltage",
            ".temp <c>    set the scripted battery temperature",
            ".status      show clock, schedule, switches, watchdog",
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_commands_round_trip_over_the_simulated_wire() {
        let mut session = Session::new();
        let output = session.handle_line("T1430");
        assert!(output.contains(&"T=14:30".to_string()), "{output:?}");
    }

    #[test]
    fn tick_directive_advances_the_clock() {
        let mut session = Session::new();
        session.handle_line(".tick 120");
        assert_eq!(session.controller.clock().minute, 2);
    }

    #[test]
    fn load_transition_is_reported() {
        let mut session = Session::new();
        let output = session.handle_line(".tick 5");
        assert!(output.contains(&"[load on]".to_string()), "{output:?}");
    }
}
