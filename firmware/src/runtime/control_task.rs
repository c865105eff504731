//! Foreground control loop.
//!
//! Each iteration runs the per-second supervisor policy (when a second has
//! elapsed) and then drains the serial link into the command interpreter.
//! The bounded blocking ADC conversion happens in here, never in the timing
//! tasks.

use embassy_time::{Duration, Timer};

use super::CONTROLLER;
use crate::hw::{BatteryAdc, Switches};

/// Foreground cadence. Far faster than the one-second policy edge, slow
/// enough to keep the lock uncontended between bit intervals.
const LOOP_PERIOD: Duration = Duration::from_millis(5);

#[embassy_executor::task]
pub async fn run(mut sampler: BatteryAdc<'static>, mut switches: Switches<'static>) -> ! {
    loop {
        CONTROLLER.lock(|controller| {
            controller.borrow_mut().poll(&mut sampler, &mut switches);
        });
        Timer::after(LOOP_PERIOD).await;
    }
}
