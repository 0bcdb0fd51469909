//! Recovery policy applied by the modem manager to lifecycle updates.
//!
//! A crash is answered with a reset pulse. If the modem keeps crashing without
//! reaching `Online` in between, the manager escalates to a full power cycle.

use modemctl_core::LifecycleState;
use modemctl_core::sequences::SequenceKind;

/// Resets attempted before escalating to a power cycle.
pub const MAX_CRASH_RESETS: u8 = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum RecoveryAction {
    None,
    Reset,
    PowerCycle,
}

impl RecoveryAction {
    /// Sequences to run, in order.
    pub fn sequences(self) -> &'static [SequenceKind] {
        match self {
            RecoveryAction::None => &[],
            RecoveryAction::Reset => &[SequenceKind::Reset],
            RecoveryAction::PowerCycle => &[SequenceKind::PowerOff, SequenceKind::PowerOn],
        }
    }
}

#[derive(Debug)]
pub struct RecoveryPolicy {
    max_resets: u8,
    crashes_since_online: u8,
}

impl RecoveryPolicy {
    pub const fn new(max_resets: u8) -> Self {
        Self {
            max_resets,
            crashes_since_online: 0,
        }
    }

    pub fn on_state(&mut self, state: LifecycleState) -> RecoveryAction {
        match state {
            LifecycleState::Online => {
                self.crashes_since_online = 0;
                RecoveryAction::None
            }
            LifecycleState::CrashExit => {
                self.crashes_since_online = self.crashes_since_online.saturating_add(1);
                if self.crashes_since_online > self.max_resets {
                    self.crashes_since_online = 0;
                    RecoveryAction::PowerCycle
                } else {
                    RecoveryAction::Reset
                }
            }
            LifecycleState::Offline | LifecycleState::Booting => RecoveryAction::None,
        }
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::new(MAX_CRASH_RESETS)
    }
}
