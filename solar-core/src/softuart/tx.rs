//! Transmit bit state machine.

use super::Level;
use crate::ring::RingBuffer;

/// Progress through one outbound frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum TxState {
    /// Line idles high; waiting for the outbound ring to offer a byte.
    Idle,
    /// Shifting the byte in flight, least-significant bit first.
    Shifting { data: u8, bits_sent: u8 },
}

/// Timer-driven serial transmitter.
///
/// [`Transmitter::tick`] is called once per bit interval from the same timer
/// event that advances the time base. A byte begun is always finished: the
/// ring is only consulted again after the stop bit has gone out.
#[derive(Clone, Debug)]
pub struct Transmitter {
    state: TxState,
}

impl Transmitter {
    /// Transmitter with an idle line.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TxState::Idle,
        }
    }

    /// Returns `true` while no frame is in flight.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, TxState::Idle)
    }

    /// Advances the state machine by one bit interval.
    ///
    /// Returns the level to drive on the TX line for this interval, or
    /// `None` when the line should stay at its idle (high) state.
    pub fn tick<const N: usize>(&mut self, outbound: &mut RingBuffer<N>) -> Option<Level> {
        match self.state {
            TxState::Idle => {
                let byte = outbound.pop()?;
                self.state = TxState::Shifting {
                    data: byte,
                    bits_sent: 0,
                };
                // Start bit.
                Some(Level::Low)
            }
            TxState::Shifting { data, bits_sent } if bits_sent < 8 => {
                self.state = TxState::Shifting {
                    data: data >> 1,
                    bits_sent: bits_sent + 1,
                };
                Some(Level::from_bit((data & 0x01) != 0))
            }
            TxState::Shifting { .. } => {
                self.state = TxState::Idle;
                // Stop bit; the next tick may immediately start a new frame.
                Some(Level::High)
            }
        }
    }
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}
