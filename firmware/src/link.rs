//! Shared-memory link state touched by the power sequencer.
//!
//! The IPC transport owns the buffers; the sequencer only needs to stamp the
//! handshake word before the modem boots and to inspect the write-pending lock
//! around a reset. Both live in atomics so the transport's interrupt handler
//! and the sequencer never need a lock between them.

use modemctl_core::link::{LinkControl, WritePend};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Handshake word the modem expects to find after boot.
pub const LINK_MAGIC: u32 = 0x4450_524D;

pub struct SharedMemoryLink {
    magic: AtomicU32,
    write_pend: AtomicBool,
    handshakes: AtomicU32,
}

impl SharedMemoryLink {
    pub const fn new() -> Self {
        Self {
            magic: AtomicU32::new(0),
            write_pend: AtomicBool::new(false),
            handshakes: AtomicU32::new(0),
        }
    }

    /// Called by the transport when it takes or drops the write lock.
    pub fn set_write_pend(&self, held: bool) {
        self.write_pend.store(held, Ordering::Release);
    }

    pub fn magic(&self) -> u32 {
        self.magic.load(Ordering::Acquire)
    }

    /// Number of times the handshake word has been stamped.
    pub fn handshakes(&self) -> u32 {
        self.handshakes.load(Ordering::Relaxed)
    }
}

impl LinkControl for SharedMemoryLink {
    fn init_magic_num(&self) {
        self.magic.store(LINK_MAGIC, Ordering::Release);
        self.handshakes.fetch_add(1, Ordering::Relaxed);
    }

    fn write_pend(&self) -> WritePend {
        if self.write_pend.load(Ordering::Acquire) {
            WritePend::Locked
        } else {
            WritePend::Unlocked
        }
    }

    fn release_write_pend(&self) {
        self.write_pend.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_stamps_magic_word() {
        let link = SharedMemoryLink::new();
        assert_eq!(link.magic(), 0);

        link.init_magic_num();
        link.init_magic_num();

        assert_eq!(link.magic(), LINK_MAGIC);
        assert_eq!(link.handshakes(), 2);
    }

    #[test]
    fn write_pend_tracks_transport_lock() {
        let link = SharedMemoryLink::new();
        assert_eq!(link.write_pend(), WritePend::Unlocked);

        link.set_write_pend(true);
        assert_eq!(link.write_pend(), WritePend::Locked);

        link.release_write_pend();
        assert_eq!(link.write_pend(), WritePend::Unlocked);
    }
}
