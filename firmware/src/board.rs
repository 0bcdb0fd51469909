//! Pin map for the STM32G0B1 carrier.
//!
//! GPIO numbers follow the `port * 16 + pin` convention so log output can be
//! matched to the schematic (`gpio4` is PA4, `gpio16` is PB0).

use modemctl_core::link::WritePendPolicy;
use modemctl_core::{GpioNum, ModemPlatformData};

const fn pin(port: u8, index: u8) -> GpioNum {
    GpioNum(port as u16 * 16 + index as u16)
}

const PORT_A: u8 = 0;
const PORT_B: u8 = 1;

pub const CP_ON: GpioNum = pin(PORT_A, 4);
pub const CP_RESET: GpioNum = pin(PORT_A, 5);
pub const PDA_ACTIVE: GpioNum = pin(PORT_A, 6);
pub const CP_OFF: GpioNum = pin(PORT_A, 7);
pub const PHONE_ACTIVE: GpioNum = pin(PORT_B, 0);
pub const HOST_WAKEUP: GpioNum = pin(PORT_B, 1);

/// Platform description handed to `ModemControl::init`.
pub const PLATFORM: ModemPlatformData = ModemPlatformData {
    gpio_cp_on: Some(CP_ON),
    gpio_cp_off: Some(CP_OFF),
    gpio_cp_reset: Some(CP_RESET),
    gpio_pda_active: Some(PDA_ACTIVE),
    gpio_phone_active: Some(PHONE_ACTIVE),
    gpio_host_wakeup: Some(HOST_WAKEUP),
    write_pend_policy: WritePendPolicy::Observe,
    ..ModemPlatformData::unwired("qsc6085")
};
