//! Lifecycle notifications forwarded from the control context to the modem
//! manager task.

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use modemctl_core::{LifecycleNotifier, LifecycleState};
use portable_atomic::{AtomicU32, Ordering};

/// Depth of the lifecycle queue between the monitor and the manager.
pub const LIFECYCLE_QUEUE_DEPTH: usize = 8;

#[cfg(target_os = "none")]
pub type LifecycleMutex = CriticalSectionRawMutex;
#[cfg(not(target_os = "none"))]
pub type LifecycleMutex = NoopRawMutex;

pub type LifecycleQueue = Channel<LifecycleMutex, LifecycleState, LIFECYCLE_QUEUE_DEPTH>;
pub type LifecycleSender<'a> = Sender<'a, LifecycleMutex, LifecycleState, LIFECYCLE_QUEUE_DEPTH>;
pub type LifecycleReceiver<'a> =
    Receiver<'a, LifecycleMutex, LifecycleState, LIFECYCLE_QUEUE_DEPTH>;

/// Notifier that never blocks: a full queue drops the update and counts it.
pub struct ChannelNotifier<'a> {
    sender: LifecycleSender<'a>,
    dropped: AtomicU32,
}

impl<'a> ChannelNotifier<'a> {
    pub fn new(sender: LifecycleSender<'a>) -> Self {
        Self {
            sender,
            dropped: AtomicU32::new(0),
        }
    }

    /// Notifications lost to a full queue.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LifecycleNotifier for ChannelNotifier<'_> {
    fn on_state_changed(&self, state: LifecycleState) {
        if self.sender.try_send(state).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}
