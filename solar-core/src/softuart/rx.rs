//! Receive bit state machine.

use super::Level;
use crate::ring::RingBuffer;

/// Number of mid-cell samples shifted per frame: the start-bit settle plus
/// eight data bits. The sample after those delivers the byte.
const SAMPLES_PER_FRAME: u8 = 9;

/// What the driver should do after a mid-bit sample.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SampleOutcome {
    /// Keep the bit-interval sample timer armed; more bits are expected.
    Continue,
    /// A full byte landed in the inbound ring: stop the sample timer and
    /// re-enable start-bit edge detection.
    ByteComplete,
}

/// Progress through one inbound frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum RxState {
    /// Waiting for a falling start-bit edge.
    Idle,
    /// Shifting mid-cell samples, least-significant bit first.
    Receiving { data: u8, samples: u8 },
}

/// Edge-armed, timer-sampled serial receiver.
///
/// The falling edge of a start bit calls [`Receiver::start_bit`]; the driver
/// then schedules the first sample half a bit interval later so every sample
/// lands mid-cell, and feeds one line level per interval into
/// [`Receiver::sample`] until it reports [`SampleOutcome::ByteComplete`].
/// Edge detection and sampling are mutually exclusive by construction, so
/// the two receive events never race each other.
#[derive(Clone, Debug)]
pub struct Receiver {
    state: RxState,
}

impl Receiver {
    /// Receiver waiting for a start bit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RxState::Idle,
        }
    }

    /// Arms reception after a falling start-bit edge.
    pub fn start_bit(&mut self) {
        self.state = RxState::Receiving {
            data: 0,
            samples: 0,
        };
    }

    /// Shifts in one mid-cell sample.
    ///
    /// The first sample falls inside the start bit and is shifted back out by
    /// the time the frame completes, so only the eight data bits survive. No
    /// framing validation is performed; a broken stop bit still delivers
    /// whatever was shifted in.
    pub fn sample<const N: usize>(
        &mut self,
        level: Level,
        inbound: &mut RingBuffer<N>,
    ) -> SampleOutcome {
        match self.state {
            RxState::Receiving { data, samples } if samples < SAMPLES_PER_FRAME => {
                let mut shifted = data >> 1;
                if level.is_high() {
                    shifted |= 0x80;
                }
                self.state = RxState::Receiving {
                    data: shifted,
                    samples: samples + 1,
                };
                SampleOutcome::Continue
            }
            RxState::Receiving { data, .. } => {
                inbound.push(data);
                self.state = RxState::Idle;
                SampleOutcome::ByteComplete
            }
            // A sample with no start bit armed is spurious; tell the driver
            // to stand down.
            RxState::Idle => SampleOutcome::ByteComplete,
        }
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}
