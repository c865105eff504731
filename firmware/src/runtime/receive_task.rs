//! Start-bit edge detection and mid-cell receive sampling.
//!
//! The two receive events are mutually exclusive by construction: while a
//! frame is being sampled the edge wait is not running, and it only resumes
//! once the byte has been delivered. The first sample is scheduled half a
//! bit interval after the falling edge so every sample lands mid-cell.

use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Timer};
use solar_core::softuart::{Level, SampleOutcome};

use super::CONTROLLER;
use super::tick_task::BIT_INTERVAL;

const HALF_BIT: Duration = Duration::from_micros(BIT_INTERVAL.as_micros() / 2);

#[embassy_executor::task]
pub async fn run(mut rx_line: ExtiInput<'static>) -> ! {
    loop {
        rx_line.wait_for_falling_edge().await;
        CONTROLLER.lock(|controller| controller.borrow_mut().rx_start_edge());
        Timer::after(HALF_BIT).await;

        loop {
            let level = if rx_line.is_high() {
                Level::High
            } else {
                Level::Low
            };
            let outcome = CONTROLLER.lock(|controller| controller.borrow_mut().rx_sample(level));
            match outcome {
                SampleOutcome::Continue => Timer::after(BIT_INTERVAL).await,
                SampleOutcome::ByteComplete => break,
            }
        }
    }
}
