//! Line assembly and command execution.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::clock::WallClock;
use crate::repl::grammar::{self, Command};
use crate::ring::{RingBuffer, RingWriter};
use crate::softuart::LINK_BUFFER_CAPACITY;
use crate::supervisor::Supervisor;

/// Reply literals, carriage-return/line-feed terminated like every reply.
pub const HELLO_REPLY: &str = "Hello from controller !\r\n";
pub const ERROR_REPLY: &str = "Command error\r\n";
pub const KILL_REPLY: &str = "Bye bye\r\n";
pub const REBOOT_REPLY: &str = "Rebooting\r\n";

/// Accumulates inbound bytes into one carriage-return terminated line.
///
/// Bytes past the capacity overwrite the final slot, matching the bounded
/// buffering everywhere else on the link. Once the terminator arrives the
/// line is a complete, immutable view until [`LineAccumulator::reset`];
/// further bytes are ignored rather than smearing into the pending command.
#[derive(Clone, Debug)]
pub struct LineAccumulator {
    buffer: Vec<u8, LINK_BUFFER_CAPACITY>,
    ready: bool,
}

impl LineAccumulator {
    /// Empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            ready: false,
        }
    }

    /// Feeds one inbound byte. A carriage return completes the line and is
    /// not stored.
    pub fn push(&mut self, byte: u8) {
        if self.ready {
            return;
        }
        if byte == b'\r' {
            self.ready = true;
            return;
        }
        if let Err(byte) = self.buffer.push(byte) {
            if let Some(last) = self.buffer.last_mut() {
                *last = byte;
            }
        }
    }

    /// Returns `true` once a terminator has arrived.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// The completed line, available only after the terminator.
    #[must_use]
    pub fn completed(&self) -> Option<&[u8]> {
        self.ready.then_some(self.buffer.as_slice())
    }

    /// Clears the line and the ready flag after dispatch.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.ready = false;
    }
}

impl Default for LineAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses and executes one command line, serializing the reply into the
/// outbound ring.
///
/// Side effects are confined to the clock, the schedule, the liveness flag,
/// and the escalation countdowns; switch outputs only ever move on the
/// supervisor's own second boundary. Any parse failure earns the generic
/// error reply; the protocol has no other error surface.
pub fn dispatch<const N: usize>(
    line: &[u8],
    clock: &mut WallClock,
    supervisor: &mut Supervisor,
    outbound: &mut RingBuffer<N>,
) {
    let mut reply = RingWriter::new(outbound);
    let rendered = match grammar::parse(line) {
        Ok(command) => execute(command, clock, supervisor, &mut reply),
        Err(_) => reply.write_str(ERROR_REPLY),
    };
    // The ring writer is infallible; formatting cannot fail.
    debug_assert!(rendered.is_ok());
}

fn execute<const N: usize>(
    command: Command,
    clock: &mut WallClock,
    supervisor: &mut Supervisor,
    reply: &mut RingWriter<'_, N>,
) -> fmt::Result {
    match command {
        Command::Hello => reply.write_str(HELLO_REPLY),
        Command::Battery => {
            let reading = supervisor.battery();
            let power = supervisor.power();
            write!(
                reply,
                "B={} T={} S={} L={}\r\n",
                reading.voltage_mv,
                reading.temperature_c,
                u8::from(power.charge_enabled()),
                u8::from(power.load_enabled()),
            )
        }
        Command::Time(set) => {
            if let Some(time) = set {
                clock.set_time(time);
                supervisor.power_mut().confirm_liveness();
            }
            let now = clock.snapshot();
            write!(reply, "T={:02}:{:02}\r\n", now.hour, now.minute)
        }
        Command::StartTime(set) => {
            if let Some(time) = set {
                supervisor.schedule_mut().start = time;
            }
            write!(reply, "A={}\r\n", supervisor.schedule().start)
        }
        Command::StopTime(set) => {
            if let Some(time) = set {
                supervisor.schedule_mut().stop = time;
            }
            write!(reply, "S={}\r\n", supervisor.schedule().stop)
        }
        Command::Kill => {
            supervisor.recovery_mut().arm_kill();
            reply.write_str(KILL_REPLY)
        }
        Command::Reboot => {
            supervisor.recovery_mut().arm_reboot();
            reply.write_str(REBOOT_REPLY)
        }
    }
}
