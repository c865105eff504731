//! Bit-interval ticker: time base plus transmit shifting.

use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Ticker};
use solar_core::softuart::{BAUD, Level};

use super::CONTROLLER;

/// One serial bit interval; the same tick advances the wall clock.
pub(super) const BIT_INTERVAL: Duration = Duration::from_hz(BAUD as u64);

#[embassy_executor::task]
pub async fn run(mut tx_line: Output<'static>) -> ! {
    let mut ticker = Ticker::every(BIT_INTERVAL);
    loop {
        ticker.next().await;
        let drive = CONTROLLER.lock(|controller| controller.borrow_mut().tick());
        match drive {
            Some(Level::High) => tx_line.set_high(),
            Some(Level::Low) => tx_line.set_low(),
            // Idle: the line already rests high.
            None => {}
        }
    }
}
