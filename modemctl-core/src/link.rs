//! Narrow view of the byte-transport link used by the sequencer.
//!
//! The link driver (shared-memory or serial) owns its own synchronization; the
//! sequencer only resets its framing counter and inspects the write-pending
//! lock around a modem reset.

/// State of the link's write-pending lock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WritePend {
    Unlocked,
    Locked,
}

/// What the reset sequence does when it finds the write-pending lock held.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WritePendPolicy {
    /// Inspect the lock and leave it held.
    #[default]
    Observe,
    /// Ask the link to release the lock before pulsing reset.
    Release,
}

/// Link operations the sequencer depends on.
pub trait LinkControl {
    /// Resets the framing counter ("magic number") to its initial value.
    fn init_magic_num(&self);

    /// Reads the write-pending lock.
    fn write_pend(&self) -> WritePend;

    /// Requests release of the write-pending lock.
    fn release_write_pend(&self);
}

impl<T: LinkControl + ?Sized> LinkControl for &T {
    fn init_magic_num(&self) {
        (**self).init_magic_num();
    }

    fn write_pend(&self) -> WritePend {
        (**self).write_pend()
    }

    fn release_write_pend(&self) {
        (**self).release_write_pend();
    }
}
