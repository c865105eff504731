//! Embassy runtime wiring for the controller.
//!
//! The three interrupt sources of the design map onto three tasks: the
//! bit-interval ticker (time base + transmit), the receive edge/sample task,
//! and the foreground control loop. They share the one [`Controller`] value
//! through a critical-section mutex, so every multi-step state update is
//! serialized against the others exactly as the shared-state ownership
//! rules require.

use core::cell::RefCell;

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::Adc;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level as PinLevel, Output, Pull, Speed};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use solar_core::controller::Controller;

use crate::hw;

mod control_task;
mod receive_task;
mod tick_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// The process-wide controller state, shared by all three tasks.
pub(super) static CONTROLLER: Mutex<CriticalSectionRawMutex, RefCell<Controller>> =
    Mutex::new(RefCell::new(Controller::new()));

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA2,
        PA3,
        PA7,
        PB2,
        EXTI2,
        ADC1,
        ..
    } = hal::init(config);

    // Everything starts switched off; the TX line idles high.
    let switches = hw::Switches::new(
        Output::new(PA2, PinLevel::Low, Speed::Low),
        Output::new(PA1, PinLevel::Low, Speed::Low),
        Output::new(PA3, PinLevel::High, Speed::Low),
    );
    let sampler = hw::BatteryAdc::new(Adc::new(ADC1), PA0);

    let tx_line = Output::new(PA7, PinLevel::High, Speed::Low);
    let rx_line = ExtiInput::new(PB2, EXTI2, Pull::Up);

    info!("solar controller up");

    spawner
        .spawn(tick_task::run(tx_line))
        .expect("failed to spawn tick task");
    spawner
        .spawn(receive_task::run(rx_line))
        .expect("failed to spawn receive task");
    spawner
        .spawn(control_task::run(sampler, switches))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
