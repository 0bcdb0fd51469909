//! Errors surfaced by initialization and the power sequencer.

use core::fmt;

use crate::lines::ModemLine;

/// Failure returned by [`ModemControl`](crate::ModemControl) entry points.
///
/// A power-off that never observes the modem drop its active line is not an
/// error: it is recorded as
/// [`TelemetryEventKind::PowerOffTimeout`](crate::telemetry::TelemetryEventKind::PowerOffTimeout)
/// and the operation still succeeds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemError {
    /// A required line has no GPIO bound. Reported before any line is touched.
    Configuration(ModemLine),
    /// The phone-active interrupt could not be looked up or requested.
    InterruptRegistration { irq: &'static str },
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModemError::Configuration(line) => write!(f, "no gpio bound for {line}"),
            ModemError::InterruptRegistration { irq } => {
                write!(f, "failed to register interrupt `{irq}`")
            }
        }
    }
}

impl core::error::Error for ModemError {}
