mod common;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use modemctl_core::irq::TriggerLevel;
use modemctl_core::lines::PHONE_ACTIVE_IRQ_NAME;
use modemctl_core::{LifecycleState, Level, ModemControl, ModemError, ModemLine, ModemPlatformData};

use common::{CP_ON, CP_RESET, Control, Harness, platform};

#[test]
fn init_parks_modem_and_arms_level_high() {
    let harness = Harness::default();

    let control: Control<NoopRawMutex> =
        ModemControl::init(&platform(), harness.parts()).expect("init");

    assert_eq!(
        harness.board.writes(),
        vec![(CP_RESET, Level::Low), (CP_ON, Level::Low)]
    );
    assert_eq!(
        harness.irq.requested(),
        vec![(PHONE_ACTIVE_IRQ_NAME, TriggerLevel::LevelHigh)]
    );
    assert!(harness.irq.wake_enabled());
    assert_eq!(control.state(), LifecycleState::Offline);
    assert!(harness.notifier.seen().is_empty());
}

#[test]
fn init_requires_the_mandatory_lines() {
    let cases = [
        (
            ModemPlatformData {
                gpio_cp_on: None,
                ..platform()
            },
            ModemLine::CpOn,
        ),
        (
            ModemPlatformData {
                gpio_cp_reset: None,
                ..platform()
            },
            ModemLine::CpReset,
        ),
        (
            ModemPlatformData {
                gpio_phone_active: None,
                ..platform()
            },
            ModemLine::PhoneActive,
        ),
    ];

    for (data, missing) in cases {
        let harness = Harness::default();
        let result: Result<Control<NoopRawMutex>, _> = ModemControl::init(&data, harness.parts());

        assert_eq!(result.err(), Some(ModemError::Configuration(missing)));
        assert!(harness.board.writes().is_empty());
        assert!(harness.irq.requested().is_empty());
    }
}

#[test]
fn optional_lines_may_be_absent() {
    let harness = Harness::default();
    let data = ModemPlatformData {
        gpio_pda_active: None,
        gpio_host_wakeup: None,
        gpio_cp_dump_int: None,
        ..platform()
    };

    let result: Result<Control<NoopRawMutex>, _> = ModemControl::init(&data, harness.parts());

    assert!(result.is_ok());
}

#[test]
fn refused_interrupt_fails_init() {
    let harness = Harness::default();
    harness.irq.refuse_request();

    let result: Result<Control<NoopRawMutex>, _> =
        ModemControl::init(&platform(), harness.parts());

    assert_eq!(
        result.err(),
        Some(ModemError::InterruptRegistration {
            irq: PHONE_ACTIVE_IRQ_NAME
        })
    );
}

#[test]
fn refused_wake_source_is_not_fatal() {
    let harness = Harness::default();
    harness.irq.refuse_wake();

    let result: Result<Control<NoopRawMutex>, _> =
        ModemControl::init(&platform(), harness.parts());

    assert!(result.is_ok());
    assert!(!harness.irq.wake_enabled());
    assert_eq!(harness.irq.requested().len(), 1);
}

#[test]
fn configuration_error_names_the_line() {
    let message = ModemError::Configuration(ModemLine::CpReset).to_string();
    assert!(message.contains("CP_RESET"), "{message}");
}
