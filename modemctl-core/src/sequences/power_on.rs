//! Power-on script for the QSC6085.
//!
//! With the modem released from reset, `CP_ON` is held low briefly, then
//! raised for one second while the modem's rails settle, then dropped again:
//! the line is a momentary trigger, not a sustained enable. The settle hold is
//! three separate waits (400, 400, 200 ms) rather than one.

use core::time::Duration;

use super::{SequenceKind, SequenceStep, SequenceTemplate};
use crate::lines::{Level, ModemLine};

/// Time `CP_ON` stays low after reset is released.
pub const CP_ON_PRE_LOW: Duration = Duration::from_millis(100);
/// First stage of the `CP_ON` high hold.
pub const CP_ON_HOLD_FIRST: Duration = Duration::from_millis(400);
/// Second stage of the `CP_ON` high hold.
pub const CP_ON_HOLD_SECOND: Duration = Duration::from_millis(400);
/// Final stage of the `CP_ON` high hold.
pub const CP_ON_HOLD_FINAL: Duration = Duration::from_millis(200);
/// Total time `CP_ON` stays high.
pub const CP_ON_HOLD: Duration = Duration::from_millis(1_000);

/// Ordered steps that implement power-on.
pub const POWER_ON_STEPS: [SequenceStep; 8] = [
    SequenceStep::Drive(ModemLine::CpReset, Level::High),
    SequenceStep::Drive(ModemLine::CpOn, Level::Low),
    SequenceStep::Sleep(CP_ON_PRE_LOW),
    SequenceStep::Drive(ModemLine::CpOn, Level::High),
    SequenceStep::Sleep(CP_ON_HOLD_FIRST),
    SequenceStep::Sleep(CP_ON_HOLD_SECOND),
    SequenceStep::Sleep(CP_ON_HOLD_FINAL),
    SequenceStep::Drive(ModemLine::CpOn, Level::Low),
];

/// Power-on script.
pub const POWER_ON_TEMPLATE: SequenceTemplate =
    SequenceTemplate::new(SequenceKind::PowerOn, &POWER_ON_STEPS);

/// Returns the shared power-on template.
#[must_use]
pub const fn power_on_template() -> SequenceTemplate {
    POWER_ON_TEMPLATE
}
