#![forbid(unsafe_code)]

//! Producer-side handle shared between the emulation engine and the console.
//!
//! [`DisplayLink`] is cheap to clone. The display list sits behind one mutex
//! whose critical sections are a single append or a whole-queue swap; the key
//! register and status flags are plain atomics.

use crate::command_queue::{DisplayCommand, DisplayList, FontSize};
use crate::trace_mask::TraceMask;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Shared {
    list: Mutex<DisplayList>,
    key_in: AtomicU8,
    active: AtomicBool,
    paused: AtomicBool,
    remote_active: AtomicBool,
    trace_mask: AtomicU32,
}

/// Shared handle to the display list and console status.
#[derive(Debug, Clone)]
pub struct DisplayLink {
    shared: Arc<Shared>,
}

impl DisplayLink {
    /// Create a link whose command queue holds `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                list: Mutex::new(DisplayList::new(capacity)),
                key_in: AtomicU8::new(0),
                active: AtomicBool::new(true),
                paused: AtomicBool::new(false),
                remote_active: AtomicBool::new(false),
                trace_mask: AtomicU32::new(0),
            }),
        }
    }

    fn list(&self) -> MutexGuard<'_, DisplayList> {
        // A panicking producer must not stop the display.
        self.shared
            .list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ── producer side ────────────────────────────────────────────────

    pub fn set_font(&self, font: FontSize) {
        self.list().set_font(font);
    }

    pub fn set_x(&self, x: u16) {
        self.list().set_x(x);
    }

    /// Set the row in console coordinates (0 at the bottom).
    pub fn set_y(&self, y: u16) {
        self.list().set_y(y);
    }

    pub fn queue_char(&self, ch: u8) {
        let mut list = self.list();
        let before = list.dropped();
        list.queue_char(ch);
        if list.dropped() != before {
            crate::trace!(
                target: crate::logging::TARGET,
                capacity = list.capacity(),
                "display list full, command dropped"
            );
        }
    }

    /// Read and clear the key register. Zero means no key.
    pub fn take_key(&self) -> u8 {
        self.shared.key_in.swap(0, Ordering::AcqRel)
    }

    pub fn set_paused(&self, paused: bool) {
        self.shared.paused.store(paused, Ordering::Release);
    }

    pub fn set_remote_active(&self, remote: bool) {
        self.shared.remote_active.store(remote, Ordering::Release);
    }

    pub fn trace_mask(&self) -> TraceMask {
        TraceMask::from_bits_retain(self.shared.trace_mask.load(Ordering::Acquire))
    }

    /// True while the console window runs.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    // ── console side ─────────────────────────────────────────────────

    /// Swap the pending commands into `out` and turn the cursor off.
    pub fn drain_into(&self, out: &mut Vec<DisplayCommand>) {
        self.list().drain_into(out);
    }

    /// Drop every pending command.
    pub fn discard_pending(&self) {
        self.list().discard();
    }

    /// Commands currently queued.
    pub fn pending(&self) -> usize {
        self.list().len()
    }

    /// Commands dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.list().dropped()
    }

    /// True when the engine has not consumed the last key yet.
    pub fn key_pending(&self) -> bool {
        self.shared.key_in.load(Ordering::Acquire) != 0
    }

    /// Store a key for the engine.
    pub fn post_key(&self, key: u8) {
        self.shared.key_in.store(key, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    pub fn is_remote_active(&self) -> bool {
        self.shared.remote_active.load(Ordering::Acquire)
    }

    pub fn set_trace_mask(&self, mask: TraceMask) {
        self.shared.trace_mask.store(mask.bits(), Ordering::Release);
    }

    pub fn set_active(&self, active: bool) {
        self.shared.active.store(active, Ordering::Release);
    }
}

impl Default for DisplayLink {
    fn default() -> Self {
        Self::new(crate::command_queue::DEFAULT_COMMAND_CAPACITY)
    }
}
