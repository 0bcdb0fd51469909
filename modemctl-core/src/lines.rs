//! Signal lines wired between the application processor and the modem.
//!
//! Line identifiers come from the platform description ([`ModemPlatformData`])
//! as optional GPIO numbers; [`ModemLines`] keeps the resolved set on the
//! control context. Actual pin access goes through the [`GpioBank`] trait so the
//! same sequencing logic runs against real pins, the host emulator, and test
//! doubles.

use core::fmt;

use crate::link::WritePendPolicy;

/// Name the platform uses for the phone-active interrupt resource.
pub const PHONE_ACTIVE_IRQ_NAME: &str = "phone_active_irq";

/// Digital level observed on, or driven onto, a signal line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`].
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Returns `true` for [`Level::Low`].
    #[must_use]
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value { Level::High } else { Level::Low }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> bool {
        level.is_high()
    }
}

impl core::ops::Not for Level {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Platform GPIO number.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioNum(pub u16);

impl fmt::Display for GpioNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

/// Logical signal lines between the host and the modem.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemLine {
    /// Momentary power-on trigger (`CP_ON`).
    CpOn,
    /// Power-off line (`CP_OFF`). Must be wired for power-off to run.
    CpOff,
    /// Reset line (`CP_RESET`); low holds the modem in reset.
    CpReset,
    /// Host-side activity indicator (`PDA_ACTIVE`).
    PdaActive,
    /// Modem-driven activity indicator (`PHONE_ACTIVE`).
    PhoneActive,
    /// Modem-to-host wakeup (`HOST_WAKEUP`).
    HostWakeup,
    /// Modem crash-dump interrupt (`CP_DUMP_INT`).
    CpDumpInt,
}

impl ModemLine {
    /// Board-level signal name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ModemLine::CpOn => "CP_ON",
            ModemLine::CpOff => "CP_OFF",
            ModemLine::CpReset => "CP_RESET",
            ModemLine::PdaActive => "PDA_ACTIVE",
            ModemLine::PhoneActive => "PHONE_ACTIVE",
            ModemLine::HostWakeup => "HOST_WAKEUP",
            ModemLine::CpDumpInt => "CP_DUMP_INT",
        }
    }
}

impl fmt::Display for ModemLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pin access used by the sequencer and the signal monitor.
///
/// Implementations must not block: both methods are called with the control
/// context locked, including from interrupt context.
pub trait GpioBank {
    /// Samples the current level of `gpio`.
    fn get(&mut self, gpio: GpioNum) -> Level;

    /// Drives `gpio` to `level`.
    fn set(&mut self, gpio: GpioNum, level: Level);
}

impl<T: GpioBank + ?Sized> GpioBank for &mut T {
    fn get(&mut self, gpio: GpioNum) -> Level {
        (**self).get(gpio)
    }

    fn set(&mut self, gpio: GpioNum, level: Level) {
        (**self).set(gpio, level);
    }
}

/// Platform description handed to initialization.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModemPlatformData {
    pub name: &'static str,
    pub gpio_cp_on: Option<GpioNum>,
    pub gpio_cp_off: Option<GpioNum>,
    pub gpio_cp_reset: Option<GpioNum>,
    pub gpio_pda_active: Option<GpioNum>,
    pub gpio_phone_active: Option<GpioNum>,
    pub gpio_host_wakeup: Option<GpioNum>,
    pub gpio_cp_dump_int: Option<GpioNum>,
    /// Interrupt resource name for the phone-active line.
    pub phone_active_irq: &'static str,
    /// How the reset sequence treats a held link write lock.
    pub write_pend_policy: WritePendPolicy,
}

impl ModemPlatformData {
    /// Platform data with no lines wired.
    #[must_use]
    pub const fn unwired(name: &'static str) -> Self {
        Self {
            name,
            gpio_cp_on: None,
            gpio_cp_off: None,
            gpio_cp_reset: None,
            gpio_pda_active: None,
            gpio_phone_active: None,
            gpio_host_wakeup: None,
            gpio_cp_dump_int: None,
            phone_active_irq: PHONE_ACTIVE_IRQ_NAME,
            write_pend_policy: WritePendPolicy::Observe,
        }
    }

    /// Resolves the line table carried by the control context.
    #[must_use]
    pub const fn lines(&self) -> ModemLines {
        ModemLines {
            cp_on: self.gpio_cp_on,
            cp_off: self.gpio_cp_off,
            cp_reset: self.gpio_cp_reset,
            pda_active: self.gpio_pda_active,
            phone_active: self.gpio_phone_active,
            host_wakeup: self.gpio_host_wakeup,
            cp_dump_int: self.gpio_cp_dump_int,
        }
    }
}

/// Line table bound to a control context.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ModemLines {
    pub cp_on: Option<GpioNum>,
    pub cp_off: Option<GpioNum>,
    pub cp_reset: Option<GpioNum>,
    pub pda_active: Option<GpioNum>,
    pub phone_active: Option<GpioNum>,
    pub host_wakeup: Option<GpioNum>,
    pub cp_dump_int: Option<GpioNum>,
}

impl ModemLines {
    /// Looks up the GPIO bound to `line`.
    #[must_use]
    pub const fn gpio(&self, line: ModemLine) -> Option<GpioNum> {
        match line {
            ModemLine::CpOn => self.cp_on,
            ModemLine::CpOff => self.cp_off,
            ModemLine::CpReset => self.cp_reset,
            ModemLine::PdaActive => self.pda_active,
            ModemLine::PhoneActive => self.phone_active,
            ModemLine::HostWakeup => self.host_wakeup,
            ModemLine::CpDumpInt => self.cp_dump_int,
        }
    }

    /// Returns the first line in `required` that has no GPIO bound.
    pub fn first_missing<I>(&self, required: I) -> Option<ModemLine>
    where
        I: IntoIterator<Item = ModemLine>,
    {
        required
            .into_iter()
            .find(|line| self.gpio(*line).is_none())
    }
}
