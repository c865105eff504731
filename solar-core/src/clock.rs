//! Wall-clock time base.
//!
//! The transmit bit-interval timer doubles as the time base: every overflow
//! advances a sub-second tick counter and, once per [`TICKS_PER_SECOND`]
//! ticks, the 24-hour clock. The foreground loop consumes the one-shot
//! "new second" edge through [`WallClock::take_second`], so per-second policy
//! runs exactly once per wall-clock second regardless of loop speed.

use core::fmt;

/// Bit-interval ticks per wall-clock second (one tick per 2400-baud bit).
pub const TICKS_PER_SECOND: u16 = 2400;

/// Hour/minute pair used for schedule trigger points and set-command
/// arguments.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Builds a time of day, clamping the hour to 23 and the minute to 59.
    ///
    /// Out-of-range input is clamped rather than rejected; the protocol never
    /// reports a range error.
    #[must_use]
    pub const fn clamped(hour: u8, minute: u8) -> Self {
        Self {
            hour: if hour > 23 { 23 } else { hour },
            minute: if minute > 59 { 59 } else { minute },
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Copy of the clock fields taken at a second boundary.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClockSnapshot {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// 24-hour wall clock advanced from interrupt context.
///
/// Invariant: `hour < 24`, `minute < 60`, `second < 60` at all times;
/// rollover cascades seconds into minutes into hours and wraps at midnight.
#[derive(Clone, Debug)]
pub struct WallClock {
    ticks: u16,
    hour: u8,
    minute: u8,
    second: u8,
    second_pending: bool,
}

impl WallClock {
    /// Clock starting at 00:00:00 with no pending edge.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            hour: 0,
            minute: 0,
            second: 0,
            second_pending: false,
        }
    }

    /// Advances the sub-second counter by one bit interval.
    ///
    /// Runs in interrupt context; everything here is single-field arithmetic
    /// so a preempted foreground reader only ever observes whole values.
    pub fn tick(&mut self) {
        self.ticks += 1;
        if self.ticks == TICKS_PER_SECOND {
            self.ticks = 0;
            self.advance_second();
            self.second_pending = true;
        }
    }

    fn advance_second(&mut self) {
        self.second += 1;
        if self.second == 60 {
            self.second = 0;
            self.minute += 1;
            if self.minute == 60 {
                self.minute = 0;
                self.hour += 1;
                if self.hour == 24 {
                    self.hour = 0;
                }
            }
        }
    }

    /// Consumes the one-shot second edge, returning the current fields when
    /// a new second has elapsed since the last call.
    pub fn take_second(&mut self) -> Option<ClockSnapshot> {
        if self.second_pending {
            self.second_pending = false;
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Current clock fields.
    #[must_use]
    pub const fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }

    /// Sets hour and minute from a time-set command. Seconds keep running;
    /// the operator only ever corrects the coarse fields.
    pub fn set_time(&mut self, time: TimeOfDay) {
        let time = TimeOfDay::clamped(time.hour, time.minute);
        self.hour = time.hour;
        self.minute = time.minute;
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u8, minute: u8, second: u8) -> WallClock {
        let mut clock = WallClock::new();
        clock.set_time(TimeOfDay { hour, minute });
        for _ in 0..second {
            clock.advance_second();
        }
        clock
    }

    fn tick_one_second(clock: &mut WallClock) {
        for _ in 0..TICKS_PER_SECOND {
            clock.tick();
        }
    }

    #[test]
    fn sub_second_ticks_do_not_advance_the_clock() {
        let mut clock = WallClock::new();
        for _ in 0..u32::from(TICKS_PER_SECOND) - 1 {
            clock.tick();
        }
        assert_eq!(clock.snapshot().second, 0);
        assert!(clock.take_second().is_none());
        clock.tick();
        assert_eq!(clock.snapshot().second, 1);
    }

    #[test]
    fn seconds_roll_into_minutes() {
        let mut clock = at(0, 0, 59);
        tick_one_second(&mut clock);
        let now = clock.snapshot();
        assert_eq!((now.minute, now.second), (1, 0));
    }

    #[test]
    fn minutes_roll_into_hours() {
        let mut clock = at(4, 59, 59);
        tick_one_second(&mut clock);
        let now = clock.snapshot();
        assert_eq!((now.hour, now.minute, now.second), (5, 0, 0));
    }

    #[test]
    fn midnight_wraps_the_full_cascade() {
        let mut clock = at(23, 59, 59);
        tick_one_second(&mut clock);
        let now = clock.snapshot();
        assert_eq!((now.hour, now.minute, now.second), (0, 0, 0));
    }

    #[test]
    fn second_edge_is_consumed_once() {
        let mut clock = WallClock::new();
        tick_one_second(&mut clock);
        assert!(clock.take_second().is_some());
        assert!(clock.take_second().is_none());
    }

    #[test]
    fn set_time_clamps_and_preserves_seconds() {
        let mut clock = at(0, 0, 30);
        clock.set_time(TimeOfDay {
            hour: 25,
            minute: 99,
        });
        let now = clock.snapshot();
        assert_eq!((now.hour, now.minute, now.second), (23, 59, 30));
    }

    #[test]
    fn time_of_day_formats_zero_padded() {
        let mut rendered = heapless::String::<8>::new();
        core::fmt::write(
            &mut rendered,
            format_args!("{}", TimeOfDay { hour: 8, minute: 5 }),
        )
        .unwrap();
        assert_eq!(rendered.as_str(), "08:05");
    }
}
