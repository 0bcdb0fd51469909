//! Interrupt seam for the phone-active line.

use core::fmt;

use crate::lines::Level;

/// Level at which the phone-active interrupt fires next.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerLevel {
    LevelLow,
    LevelHigh,
}

impl TriggerLevel {
    /// Trigger that fires once the line leaves `observed`.
    #[must_use]
    pub const fn complement_of(observed: Level) -> Self {
        match observed {
            Level::High => TriggerLevel::LevelLow,
            Level::Low => TriggerLevel::LevelHigh,
        }
    }

    /// Line level that satisfies this trigger.
    #[must_use]
    pub const fn level(self) -> Level {
        match self {
            TriggerLevel::LevelLow => Level::Low,
            TriggerLevel::LevelHigh => Level::High,
        }
    }
}

impl fmt::Display for TriggerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerLevel::LevelLow => f.write_str("level-low"),
            TriggerLevel::LevelHigh => f.write_str("level-high"),
        }
    }
}

/// Interrupt controller binding for the phone-active line.
///
/// The handler itself is not registered here: the platform glue invokes
/// [`ModemControl::on_phone_active_irq`](crate::ModemControl::on_phone_active_irq)
/// whenever the armed level is present.
pub trait PhoneActiveIrq {
    type Error: fmt::Debug;

    /// Resolves the interrupt resource named `name` and arms it at `trigger`.
    fn request(&mut self, name: &'static str, trigger: TriggerLevel) -> Result<(), Self::Error>;

    /// Re-arms the interrupt at a new level. Called from interrupt context.
    fn set_trigger(&mut self, trigger: TriggerLevel);

    /// Marks the interrupt as a system wake source.
    fn enable_wake(&mut self) -> Result<(), Self::Error>;
}
