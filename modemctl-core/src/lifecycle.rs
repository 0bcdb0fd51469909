//! Modem lifecycle states and the subscriber contract.

use core::fmt;

/// Operational phase of the modem as inferred from its signal lines.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    #[default]
    Offline,
    Booting,
    Online,
    CrashExit,
}

impl LifecycleState {
    /// Every state, in declaration order.
    pub const ALL: [LifecycleState; 4] = [
        LifecycleState::Offline,
        LifecycleState::Booting,
        LifecycleState::Online,
        LifecycleState::CrashExit,
    ];

    /// Short lowercase label used by logs and the emulator prompt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            LifecycleState::Offline => "offline",
            LifecycleState::Booting => "booting",
            LifecycleState::Online => "online",
            LifecycleState::CrashExit => "crash-exit",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Subscriber told about every lifecycle transition.
///
/// `on_state_changed` runs synchronously from the phone-active interrupt as
/// well as from the sequencer, with the control context locked but its state
/// already updated. It may read the context (`state()`, `lines()`). It must not
/// block, sleep, run a sequence, or invoke the monitor handler.
pub trait LifecycleNotifier {
    fn on_state_changed(&self, state: LifecycleState);
}

impl<T: LifecycleNotifier + ?Sized> LifecycleNotifier for &T {
    fn on_state_changed(&self, state: LifecycleState) {
        (**self).on_state_changed(state);
    }
}

/// A missing subscriber drops notifications.
impl<T: LifecycleNotifier> LifecycleNotifier for Option<T> {
    fn on_state_changed(&self, state: LifecycleState) {
        if let Some(notifier) = self {
            notifier.on_state_changed(state);
        }
    }
}

/// Notifier that ignores every transition.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopNotifier;

impl LifecycleNotifier for NoopNotifier {
    fn on_state_changed(&self, _: LifecycleState) {}
}
