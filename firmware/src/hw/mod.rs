//! Embassy-backed implementations of the modem control seams.

use embassy_stm32::gpio::{Input, Output};
use embassy_time::{Duration, block_for};
use modemctl_core::{GpioBank, GpioNum, Level, SequenceDelay};

use crate::board::{CP_OFF, CP_ON, CP_RESET, PHONE_ACTIVE};

/// Pins the control context drives or samples.
pub struct BoardGpio<'d> {
    cp_on: Output<'d>,
    cp_off: Output<'d>,
    cp_reset: Output<'d>,
    phone_active: Input<'d>,
}

impl<'d> BoardGpio<'d> {
    pub fn new(
        cp_on: Output<'d>,
        cp_off: Output<'d>,
        cp_reset: Output<'d>,
        phone_active: Input<'d>,
    ) -> Self {
        Self {
            cp_on,
            cp_off,
            cp_reset,
            phone_active,
        }
    }

    fn output_mut(&mut self, gpio: GpioNum) -> Option<&mut Output<'d>> {
        match gpio {
            CP_ON => Some(&mut self.cp_on),
            CP_OFF => Some(&mut self.cp_off),
            CP_RESET => Some(&mut self.cp_reset),
            _ => None,
        }
    }
}

impl GpioBank for BoardGpio<'_> {
    fn get(&mut self, gpio: GpioNum) -> Level {
        if gpio == PHONE_ACTIVE {
            return self.phone_active.is_high().into();
        }
        match self.output_mut(gpio) {
            Some(output) => output.is_set_high().into(),
            None => {
                defmt::warn!("gpio: read of unmapped {}", gpio);
                Level::Low
            }
        }
    }

    fn set(&mut self, gpio: GpioNum, level: Level) {
        match self.output_mut(gpio) {
            Some(output) if level.is_high() => output.set_high(),
            Some(output) => output.set_low(),
            None => defmt::warn!("gpio: write to unmapped {}", gpio),
        }
    }
}

/// Blocks the calling executor for every wait.
///
/// Only the manager task runs sequences; the phone-active monitor lives on the
/// interrupt executor and keeps running while this spins.
pub struct BlockingDelay;

impl SequenceDelay for BlockingDelay {
    fn sleep(&mut self, duration: core::time::Duration) {
        block_for(core_duration_to_embassy(duration));
    }

    fn busy_wait(&mut self, duration: core::time::Duration) {
        block_for(core_duration_to_embassy(duration));
    }
}

fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}
