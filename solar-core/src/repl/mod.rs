//! Serial command interpreter.
//!
//! Inbound bytes accumulate into carriage-return terminated lines; a
//! completed line is parsed by the [`grammar`] module into an explicit
//! command variant and executed by [`commands`], which mutates the shared
//! configuration and serializes the textual reply into the outbound ring.

pub mod commands;
pub mod grammar;

pub use commands::{LineAccumulator, dispatch};
pub use grammar::Command;
