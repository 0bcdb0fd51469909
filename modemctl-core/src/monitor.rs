//! Phone-active signal monitor.
//!
//! The modem raises `PHONE_ACTIVE` while it is running. Read together with the
//! host-driven `CP_RESET` line, the two levels identify whether the modem came
//! up, crashed out, or was taken down. [`evaluate`] is the side-effect free
//! decision; the control context applies the outcome (state, notification,
//! trigger re-arm) under its lock.

use crate::irq::TriggerLevel;
use crate::lifecycle::LifecycleState;
use crate::lines::Level;

/// Line levels sampled when the phone-active interrupt fires.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhoneActiveSample {
    pub cp_reset: Level,
    pub phone_active: Level,
}

impl PhoneActiveSample {
    #[must_use]
    pub const fn new(cp_reset: Level, phone_active: Level) -> Self {
        Self {
            cp_reset,
            phone_active,
        }
    }
}

/// Result of evaluating one phone-active interrupt.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorDecision {
    /// State recorded after the interrupt.
    pub state: LifecycleState,
    /// State to report to the subscriber, if any.
    pub notify: Option<LifecycleState>,
    /// Level the interrupt must be armed at next.
    pub rearm: TriggerLevel,
}

impl MonitorDecision {
    /// Returns `true` when the recorded state changes or a notification is due.
    #[must_use]
    pub fn is_transition(&self, previous: LifecycleState) -> bool {
        self.notify.is_some() || self.state != previous
    }
}

/// Maps a line sample and the previously recorded state to the next state.
///
/// | reset | active | outcome                                             |
/// |-------|--------|-----------------------------------------------------|
/// | high  | high   | `Online`, always reported                           |
/// | high  | low    | `CrashExit` if previously `Online`, else unchanged  |
/// | low   | any    | `Offline`, always reported                          |
///
/// Never yields [`LifecycleState::Booting`]. The re-arm level is always the
/// complement of the sampled active level.
#[must_use]
pub fn evaluate(sample: PhoneActiveSample, previous: LifecycleState) -> MonitorDecision {
    let (state, notify) = match (sample.cp_reset, sample.phone_active) {
        (Level::High, Level::High) => (LifecycleState::Online, Some(LifecycleState::Online)),
        (Level::High, Level::Low) if previous == LifecycleState::Online => {
            (LifecycleState::CrashExit, Some(LifecycleState::CrashExit))
        }
        (Level::High, Level::Low) => (previous, None),
        (Level::Low, _) => (LifecycleState::Offline, Some(LifecycleState::Offline)),
    };

    MonitorDecision {
        state,
        notify,
        rearm: TriggerLevel::complement_of(sample.phone_active),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [Level; 2] = [Level::Low, Level::High];

    #[test]
    fn reset_released_and_active_reports_online() {
        for previous in LifecycleState::ALL {
            let decision = evaluate(PhoneActiveSample::new(Level::High, Level::High), previous);
            assert_eq!(decision.state, LifecycleState::Online);
            assert_eq!(decision.notify, Some(LifecycleState::Online));
            assert_eq!(decision.rearm, TriggerLevel::LevelLow);
        }
    }

    #[test]
    fn active_drop_while_online_is_a_crash() {
        let decision = evaluate(
            PhoneActiveSample::new(Level::High, Level::Low),
            LifecycleState::Online,
        );
        assert_eq!(decision.state, LifecycleState::CrashExit);
        assert_eq!(decision.notify, Some(LifecycleState::CrashExit));
        assert_eq!(decision.rearm, TriggerLevel::LevelHigh);
    }

    #[test]
    fn active_low_while_not_online_keeps_state() {
        for previous in [
            LifecycleState::Offline,
            LifecycleState::Booting,
            LifecycleState::CrashExit,
        ] {
            let decision = evaluate(PhoneActiveSample::new(Level::High, Level::Low), previous);
            assert_eq!(decision.state, previous);
            assert_eq!(decision.notify, None);
            assert!(!decision.is_transition(previous));
            assert_eq!(decision.rearm, TriggerLevel::LevelHigh);
        }
    }

    #[test]
    fn reset_held_reports_offline_for_either_active_level() {
        for active in LEVELS {
            let decision = evaluate(
                PhoneActiveSample::new(Level::Low, active),
                LifecycleState::Online,
            );
            assert_eq!(decision.state, LifecycleState::Offline);
            assert_eq!(decision.notify, Some(LifecycleState::Offline));
            assert_eq!(decision.rearm, TriggerLevel::complement_of(active));
        }
    }

    #[test]
    fn never_produces_booting() {
        for reset in LEVELS {
            for active in LEVELS {
                for previous in LifecycleState::ALL {
                    let decision = evaluate(PhoneActiveSample::new(reset, active), previous);
                    assert_ne!(decision.notify, Some(LifecycleState::Booting));
                    if previous != LifecycleState::Booting {
                        assert_ne!(decision.state, LifecycleState::Booting);
                    }
                }
            }
        }
    }
}
