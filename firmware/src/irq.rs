//! Phone-active interrupt arming shared between the control context and the
//! EXTI monitor task.
//!
//! The EXTI peripheral only fires on edges, so level triggering is emulated:
//! the monitor task waits for the armed level, runs the handler, and reads the
//! re-armed level back from here before waiting again.

use modemctl_core::irq::{PhoneActiveIrq, TriggerLevel};
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

const DISARMED: u8 = 0;
const ARMED_LOW: u8 = 1;
const ARMED_HIGH: u8 = 2;

/// Returned when the interrupt is requested twice.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AlreadyRequested;

pub struct TriggerCell {
    armed: AtomicU8,
    wake: AtomicBool,
}

impl TriggerCell {
    pub const fn new() -> Self {
        Self {
            armed: AtomicU8::new(DISARMED),
            wake: AtomicBool::new(false),
        }
    }

    pub fn arm(&self, trigger: TriggerLevel) {
        let raw = match trigger {
            TriggerLevel::LevelLow => ARMED_LOW,
            TriggerLevel::LevelHigh => ARMED_HIGH,
        };
        self.armed.store(raw, Ordering::Release);
    }

    pub fn armed(&self) -> Option<TriggerLevel> {
        match self.armed.load(Ordering::Acquire) {
            ARMED_LOW => Some(TriggerLevel::LevelLow),
            ARMED_HIGH => Some(TriggerLevel::LevelHigh),
            _ => None,
        }
    }

    pub fn wake_enabled(&self) -> bool {
        self.wake.load(Ordering::Relaxed)
    }
}

/// [`PhoneActiveIrq`] handle over a static [`TriggerCell`].
pub struct ExtiArm {
    cell: &'static TriggerCell,
}

impl ExtiArm {
    pub const fn new(cell: &'static TriggerCell) -> Self {
        Self { cell }
    }
}

impl PhoneActiveIrq for ExtiArm {
    type Error = AlreadyRequested;

    fn request(
        &mut self,
        _name: &'static str,
        trigger: TriggerLevel,
    ) -> Result<(), AlreadyRequested> {
        if self.cell.armed().is_some() {
            return Err(AlreadyRequested);
        }
        self.cell.arm(trigger);
        Ok(())
    }

    fn set_trigger(&mut self, trigger: TriggerLevel) {
        self.cell.arm(trigger);
    }

    fn enable_wake(&mut self) -> Result<(), AlreadyRequested> {
        // EXTI lines wake the core from Stop mode once unmasked.
        self.cell.wake.store(true, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_arms_once() {
        static CELL: TriggerCell = TriggerCell::new();
        let mut arm = ExtiArm::new(&CELL);

        assert_eq!(CELL.armed(), None);
        assert_eq!(arm.request("phone_active_irq", TriggerLevel::LevelHigh), Ok(()));
        assert_eq!(CELL.armed(), Some(TriggerLevel::LevelHigh));
        assert_eq!(
            arm.request("phone_active_irq", TriggerLevel::LevelHigh),
            Err(AlreadyRequested)
        );
    }

    #[test]
    fn set_trigger_rearms_and_wake_is_recorded() {
        static CELL: TriggerCell = TriggerCell::new();
        let mut arm = ExtiArm::new(&CELL);

        arm.set_trigger(TriggerLevel::LevelLow);
        assert_eq!(CELL.armed(), Some(TriggerLevel::LevelLow));

        assert!(!CELL.wake_enabled());
        arm.enable_wake().expect("wake");
        assert!(CELL.wake_enabled());
    }
}
