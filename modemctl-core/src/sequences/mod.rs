//! Scripted line sequences shared by firmware and host targets.
//!
//! Power-on and reset are fixed scripts of line writes and blocking waits.
//! They are encoded as `const` templates so the timing lives in one place,
//! the sequencer can check every line a script drives before touching any of
//! them, and the emulator can narrate the same steps it executes. Power-off is
//! a poll loop rather than a script; its pacing lives in [`power_off`].

use core::fmt;
use core::time::Duration;

use crate::lines::{Level, ModemLine};

pub mod power_off;
pub mod power_on;
pub mod reset;

pub use power_off::{POWER_OFF_RETRY_POLICY, power_off_retry_policy};
pub use power_on::{POWER_ON_TEMPLATE, power_on_template};
pub use reset::{RESET_TEMPLATE, reset_template};

/// Sequencer operation a template or telemetry record belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceKind {
    PowerOn,
    PowerOff,
    Reset,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKind::PowerOn => f.write_str("power-on"),
            SequenceKind::PowerOff => f.write_str("power-off"),
            SequenceKind::Reset => f.write_str("reset"),
        }
    }
}

/// Single scripted operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SequenceStep {
    /// Drive a line to a level.
    Drive(ModemLine, Level),
    /// Block for the given duration with no lock held.
    Sleep(Duration),
}

impl SequenceStep {
    /// Line written by this step, if any.
    #[must_use]
    pub const fn line(&self) -> Option<ModemLine> {
        match self {
            SequenceStep::Drive(line, _) => Some(*line),
            SequenceStep::Sleep(_) => None,
        }
    }
}

/// Immutable line script.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SequenceTemplate {
    pub kind: SequenceKind,
    pub steps: &'static [SequenceStep],
}

impl SequenceTemplate {
    #[must_use]
    pub const fn new(kind: SequenceKind, steps: &'static [SequenceStep]) -> Self {
        Self { kind, steps }
    }

    /// Returns the ordered steps that make up the script.
    #[must_use]
    pub const fn steps(&self) -> &'static [SequenceStep] {
        self.steps
    }

    /// Lines the script writes, in first-use order (duplicates included).
    pub fn driven_lines(&self) -> impl Iterator<Item = ModemLine> + '_ {
        self.steps.iter().filter_map(SequenceStep::line)
    }

    /// Sum of every wait in the script.
    #[must_use]
    pub fn total_sleep(&self) -> Duration {
        self.steps
            .iter()
            .map(|step| match step {
                SequenceStep::Sleep(duration) => *duration,
                SequenceStep::Drive(..) => Duration::ZERO,
            })
            .sum()
    }
}
