//! Foreground/interrupt composition of the controller.
//!
//! [`Controller`] gathers every piece of process-wide state into one value
//! with per-field ownership:
//!
//! - `clock`: written by the tick context; hour/minute also written by the
//!   command interpreter on a time-set.
//! - `inbound`: written by the receive sample context, drained (and flushed
//!   after dispatch) by the foreground.
//! - `outbound`: written by the foreground dispatcher, drained by the
//!   transmit tick context.
//! - `transmitter`/`receiver`: exclusively interrupt-context state.
//! - `line`/`supervisor`: exclusively foreground state.
//!
//! The methods are split along the same contexts: [`Controller::tick`],
//! [`Controller::rx_start_edge`] and [`Controller::rx_sample`] belong to the
//! platform's timer/edge events, [`Controller::poll`] to the foreground
//! loop. Platforms where those contexts preempt each other must serialize
//! access with a critical section; on the host everything runs on one
//! thread and the methods are called directly.

use crate::clock::{ClockSnapshot, WallClock};
use crate::repl::commands::{self, LineAccumulator};
use crate::softuart::{Level, LinkBuffer, Receiver, SampleOutcome, Transmitter};
use crate::supervisor::{BatterySampler, Supervisor, SwitchBank};

/// The whole controller: time base, serial link, interpreter, supervisor.
#[derive(Clone, Debug)]
pub struct Controller {
    clock: WallClock,
    inbound: LinkBuffer,
    outbound: LinkBuffer,
    transmitter: Transmitter,
    receiver: Receiver,
    line: LineAccumulator,
    supervisor: Supervisor,
}

impl Controller {
    /// Controller in its power-on state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clock: WallClock::new(),
            inbound: LinkBuffer::new(),
            outbound: LinkBuffer::new(),
            transmitter: Transmitter::new(),
            receiver: Receiver::new(),
            line: LineAccumulator::new(),
            supervisor: Supervisor::new(),
        }
    }

    /// Bit-interval tick: advances the time base and the transmitter.
    ///
    /// Returns the level to drive on the TX line this interval, if any.
    pub fn tick(&mut self) -> Option<Level> {
        self.clock.tick();
        self.transmitter.tick(&mut self.outbound)
    }

    /// Falling-edge start-bit detection on the RX line.
    ///
    /// The platform must disable edge detection and schedule the first
    /// [`Controller::rx_sample`] half a bit interval later.
    pub fn rx_start_edge(&mut self) {
        self.receiver.start_bit();
    }

    /// One mid-cell receive sample. On [`SampleOutcome::ByteComplete`] the
    /// platform stops the sample timer and re-enables edge detection.
    pub fn rx_sample(&mut self, level: Level) -> SampleOutcome {
        self.receiver.sample(level, &mut self.inbound)
    }

    /// One foreground iteration: the one-second edge (analog refresh and
    /// supervisor policy) first, then the serial drain and at most one
    /// command dispatch.
    pub fn poll(&mut self, sampler: &mut impl BatterySampler, switches: &mut impl SwitchBank) {
        if let Some(now) = self.clock.take_second() {
            self.supervisor.on_second(now, sampler, switches);
        }
        self.service_serial();
    }

    fn service_serial(&mut self) {
        while !self.line.is_ready() {
            match self.inbound.pop() {
                Some(byte) => self.line.push(byte),
                None => break,
            }
        }

        let Self {
            clock,
            inbound,
            outbound,
            line,
            supervisor,
            ..
        } = self;
        if let Some(bytes) = line.completed() {
            commands::dispatch(bytes, clock, supervisor, outbound);
            line.reset();
            // One line at a time: anything queued behind it is dropped.
            inbound.flush();
        }
    }

    /// Current clock fields.
    #[must_use]
    pub const fn clock(&self) -> ClockSnapshot {
        self.clock.snapshot()
    }

    /// Read-only view of the supervisor (switches, battery, schedule,
    /// escalation).
    #[must_use]
    pub const fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Clocks one byte through the receive state machine exactly as the wire
    /// would: start-bit edge, nine mid-cell samples, stop-bit delivery.
    /// Host front-ends use this to feed the real bit path without a pin.
    pub fn receive_byte(&mut self, byte: u8) {
        self.rx_start_edge();
        let _ = self.rx_sample(Level::Low);
        for bit in 0..8 {
            let _ = self.rx_sample(Level::from_bit((byte >> bit) & 1 != 0));
        }
        let _ = self.rx_sample(Level::High);
    }

    /// Pops one byte from the outbound ring, bypassing the transmit state
    /// machine. Host front-ends with a byte channel read replies here; the
    /// MCU drains the same ring bit by bit through [`Controller::tick`].
    pub fn pop_outbound(&mut self) -> Option<u8> {
        self.outbound.pop()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
