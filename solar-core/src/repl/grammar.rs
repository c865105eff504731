//! Parser for the serial command grammar.
//!
//! Commands are one case-insensitive letter, followed by either a `?` query
//! marker or (for the time-bearing commands) a four-digit `HHMM` argument.
//! The carriage-return terminator is stripped before parsing. The parser is
//! built from `winnow` primitives over raw bytes so malformed input degrades
//! to a single error reply instead of a panic; out-of-range digits are
//! clamped, never rejected.

use core::fmt;

use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{any, take};

use crate::clock::TimeOfDay;

/// Parsed protocol commands, carrying the optional set argument where the
/// grammar allows one. A set always reports back the value it wrote, so the
/// query and set forms share one reply path downstream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// `H?`: greeting.
    Hello,
    /// `B?`: battery voltage, temperature, and switch states.
    Battery,
    /// `T?` / `Thhmm`: read or set the wall clock.
    Time(Option<TimeOfDay>),
    /// `A?` / `Ahhmm`: read or set the schedule start.
    StartTime(Option<TimeOfDay>),
    /// `S?` / `Shhmm`: read or set the schedule stop.
    StopTime(Option<TimeOfDay>),
    /// `K?`: farewell, then shut the load down.
    Kill,
    /// `R?`: power-cycle the load.
    Reboot,
}

/// Error produced when a line does not match the grammar.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GrammarError {
    expected: &'static str,
}

impl GrammarError {
    const fn new(expected: &'static str) -> Self {
        Self { expected }
    }

    /// What the parser was looking for when it gave up.
    #[must_use]
    pub const fn expected(&self) -> &'static str {
        self.expected
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}", self.expected)
    }
}

impl<'a> ParserError<&'a [u8]> for GrammarError {
    type Inner = Self;

    fn from_input(_input: &&'a [u8]) -> Self {
        GrammarError::new("command")
    }

    fn append(
        self,
        _input: &&'a [u8],
        _token_start: &<&'a [u8] as Stream>::Checkpoint,
    ) -> Self {
        self
    }

    fn or(self, other: Self) -> Self {
        other
    }

    fn into_inner(self) -> Result<Self::Inner, Self> {
        Ok(self)
    }
}

/// Parses one complete command line (terminator already stripped).
pub fn parse(line: &[u8]) -> Result<Command, GrammarError> {
    let mut input = line;
    match command(&mut input) {
        Ok(cmd) if input.is_empty() => Ok(cmd),
        Ok(_) => Err(GrammarError::new("end of line")),
        Err(ErrMode::Backtrack(err) | ErrMode::Cut(err)) => Err(err),
        Err(ErrMode::Incomplete(_)) => Err(GrammarError::new("complete line")),
    }
}

fn command(input: &mut &[u8]) -> Result<Command, ErrMode<GrammarError>> {
    let letter: u8 = any(input)?;
    match letter.to_ascii_uppercase() {
        b'H' => {
            query_marker(input)?;
            Ok(Command::Hello)
        }
        b'B' => {
            query_marker(input)?;
            Ok(Command::Battery)
        }
        b'T' => Ok(Command::Time(query_or_set(input)?)),
        b'A' => Ok(Command::StartTime(query_or_set(input)?)),
        b'S' => Ok(Command::StopTime(query_or_set(input)?)),
        b'K' => {
            query_marker(input)?;
            Ok(Command::Kill)
        }
        b'R' => {
            query_marker(input)?;
            Ok(Command::Reboot)
        }
        _ => Err(ErrMode::Cut(GrammarError::new("command letter"))),
    }
}

fn query_marker(input: &mut &[u8]) -> Result<(), ErrMode<GrammarError>> {
    match input.split_first() {
        Some((&b'?', rest)) => {
            *input = rest;
            Ok(())
        }
        _ => Err(ErrMode::Cut(GrammarError::new("`?`"))),
    }
}

fn query_or_set(input: &mut &[u8]) -> Result<Option<TimeOfDay>, ErrMode<GrammarError>> {
    match input.split_first() {
        Some((&b'?', rest)) => {
            *input = rest;
            Ok(None)
        }
        _ => hhmm(input).map(Some),
    }
}

fn hhmm(input: &mut &[u8]) -> Result<TimeOfDay, ErrMode<GrammarError>> {
    let digits: &[u8] = take(4_usize).parse_next(input)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(ErrMode::Cut(GrammarError::new("HHMM digits")));
    }
    let hour = (digits[0] - b'0') * 10 + (digits[1] - b'0');
    let minute = (digits[2] - b'0') * 10 + (digits[3] - b'0');
    Ok(TimeOfDay::clamped(hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_forms_parse() {
        assert_eq!(parse(b"H?"), Ok(Command::Hello));
        assert_eq!(parse(b"B?"), Ok(Command::Battery));
        assert_eq!(parse(b"T?"), Ok(Command::Time(None)));
        assert_eq!(parse(b"A?"), Ok(Command::StartTime(None)));
        assert_eq!(parse(b"S?"), Ok(Command::StopTime(None)));
        assert_eq!(parse(b"K?"), Ok(Command::Kill));
        assert_eq!(parse(b"R?"), Ok(Command::Reboot));
    }

    #[test]
    fn command_letter_is_case_insensitive() {
        assert_eq!(parse(b"t1430"), parse(b"T1430"));
        assert_eq!(parse(b"h?"), Ok(Command::Hello));
    }

    #[test]
    fn set_forms_carry_their_argument() {
        assert_eq!(
            parse(b"T1430"),
            Ok(Command::Time(Some(TimeOfDay {
                hour: 14,
                minute: 30
            })))
        );
        assert_eq!(
            parse(b"A0800"),
            Ok(Command::StartTime(Some(TimeOfDay {
                hour: 8,
                minute: 0
            })))
        );
    }

    #[test]
    fn out_of_range_digits_are_clamped() {
        assert_eq!(
            parse(b"T2599"),
            Ok(Command::Time(Some(TimeOfDay {
                hour: 23,
                minute: 59
            })))
        );
    }

    #[test]
    fn unknown_letters_are_rejected() {
        assert!(parse(b"X?").is_err());
        assert!(parse(b"1?").is_err());
        assert!(parse(b"").is_err());
    }

    #[test]
    fn wrong_argument_shapes_are_rejected() {
        assert!(parse(b"T143").is_err());
        assert!(parse(b"T14300").is_err());
        assert!(parse(b"Tabcd").is_err());
        assert!(parse(b"H1430").is_err());
        assert!(parse(b"K").is_err());
        assert!(parse(b"T?x").is_err());
    }
}
