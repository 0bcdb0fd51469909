use cortex_m::interrupt as cortex_interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use modemctl_core::{ModemControl, ModemParts};
use static_cell::StaticCell;

use crate::board;
use crate::hw::BoardGpio;
use crate::irq::{ExtiArm, TriggerCell};
use crate::link::SharedMemoryLink;
use crate::notifier::{ChannelNotifier, LifecycleQueue};

mod manager_task;
mod monitor_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        cortex_interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                cortex_interrupt::enable();
            }
        }
    }
}

pub(super) type FirmwareControl = ModemControl<
    CriticalSectionRawMutex,
    BoardGpio<'static>,
    ExtiArm,
    &'static SharedMemoryLink,
    ChannelNotifier<'static>,
>;

pub(super) static LIFECYCLE_QUEUE: LifecycleQueue = LifecycleQueue::new();
pub(super) static PHONE_ACTIVE_TRIGGER: TriggerCell = TriggerCell::new();
pub(super) static LINK: SharedMemoryLink = SharedMemoryLink::new();
static CONTROL: StaticCell<FirmwareControl> = StaticCell::new();

/// Runs the phone-active monitor above thread mode so it keeps sampling while
/// the manager blocks inside a sequence.
static MONITOR_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn USART3_4_5_6_LPUART1() {
    unsafe { MONITOR_EXECUTOR.on_interrupt() }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA4,
        PA5,
        PA7,
        PB0,
        EXTI0,
        ..
    } = hal::init(config);

    // The EXTI driver owns PB0 for edge waits; the control context samples
    // the same input through a second read-only handle.
    // SAFETY: both handles configure PB0 as a floating input and neither
    // handle is ever dropped, so the pin configuration cannot change under
    // either of them.
    let phone_active_sample = unsafe { PB0.clone_unchecked() };
    let phone_active_exti = ExtiInput::new(PB0, EXTI0, Pull::None);

    let gpio = BoardGpio::new(
        Output::new(PA4, Level::Low, Speed::Low),
        Output::new(PA7, Level::Low, Speed::Low),
        Output::new(PA5, Level::Low, Speed::Low),
        Input::new(phone_active_sample, Pull::None),
    );

    let parts = ModemParts {
        gpio,
        irq: ExtiArm::new(&PHONE_ACTIVE_TRIGGER),
        link: &LINK,
        notifier: ChannelNotifier::new(LIFECYCLE_QUEUE.sender()),
    };

    let control: &'static FirmwareControl = match ModemControl::init(&board::PLATFORM, parts) {
        Ok(control) => CONTROL.init(control),
        Err(err) => {
            defmt::panic!("modem init failed: {}", err);
        }
    };

    interrupt::USART3_4_5_6_LPUART1.set_priority(Priority::P1);
    let monitor_spawner = MONITOR_EXECUTOR.start(interrupt::USART3_4_5_6_LPUART1);
    monitor_spawner
        .spawn(monitor_task::run(
            control,
            phone_active_exti,
            &PHONE_ACTIVE_TRIGGER,
        ))
        .expect("failed to spawn phone-active monitor task");

    spawner
        .spawn(manager_task::run(control, LIFECYCLE_QUEUE.receiver()))
        .expect("failed to spawn modem manager task");

    core::future::pending::<()>().await;
}
