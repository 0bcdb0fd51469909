//! Hard-reset script: pulse `CP_RESET` low, then release it.

use core::time::Duration;

use super::{SequenceKind, SequenceStep, SequenceTemplate};
use crate::lines::{Level, ModemLine};

/// Time `CP_RESET` is held low.
pub const RESET_PULSE: Duration = Duration::from_millis(100);

pub const RESET_STEPS: [SequenceStep; 3] = [
    SequenceStep::Drive(ModemLine::CpReset, Level::Low),
    SequenceStep::Sleep(RESET_PULSE),
    SequenceStep::Drive(ModemLine::CpReset, Level::High),
];

pub const RESET_TEMPLATE: SequenceTemplate =
    SequenceTemplate::new(SequenceKind::Reset, &RESET_STEPS);

#[must_use]
pub const fn reset_template() -> SequenceTemplate {
    RESET_TEMPLATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_only_touches_cp_reset() {
        assert!(RESET_TEMPLATE.driven_lines().all(|line| line == ModemLine::CpReset));
        assert_eq!(RESET_TEMPLATE.total_sleep(), RESET_PULSE);
    }
}
