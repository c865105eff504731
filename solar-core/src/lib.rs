#![no_std]

// Shared control logic for the solar power controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library; every component runs against simulated ticks and
// trait-based hardware seams so the whole control surface is testable on the
// host.

pub mod clock;
pub mod controller;
pub mod repl;
pub mod ring;
pub mod softuart;
pub mod supervisor;
