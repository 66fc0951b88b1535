#![forbid(unsafe_code)]

//! Keyboard input: chord handling on arrival, paced delivery per frame.
//!
//! Keys are queued on release. With Alt or Meta held, a few characters also
//! act on the trace mask before being queued:
//!
//! | Key | Effect |
//! |-----|--------|
//! | `0`-`9` | toggle that processor's trace bit |
//! | `c` | toggle CPU tracing |
//! | `e` | toggle ECS tracing |
//! | `x` | everything on if nothing is traced, else everything off |
//! | `p` | replaced by the paste symbol |
//!
//! Delivery happens on frame boundaries: at most one key every other frame,
//! only when the engine has consumed the previous one, and never while the
//! settle delay after a carriage return is counting down.

use phosphor_core::event::{KeyEvent, Modifiers};
use phosphor_core::key_ring::KeyRingBuffer;
use phosphor_core::keysym::KeySym;
use phosphor_core::trace_mask::TraceMask;

/// Result of feeding one key event to the [`KeyTranslator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Translated {
    /// Symbol placed in the ring, if any.
    pub queued: Option<KeySym>,
    /// The trace mask was changed by a chord.
    pub mask_changed: bool,
}

/// Turns raw key events into ring entries.
#[derive(Debug, Clone, Default)]
pub struct KeyTranslator {
    meta_latched: bool,
}

impl KeyTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a left Meta press has been seen.
    #[inline]
    pub fn meta_latched(&self) -> bool {
        self.meta_latched
    }

    pub fn on_key(
        &mut self,
        event: KeyEvent,
        ring: &mut KeyRingBuffer,
        mask: &mut TraceMask,
    ) -> Translated {
        if !event.is_release() {
            if event.sym == KeySym::META_L {
                self.meta_latched = true;
            }
            return Translated::default();
        }

        let mut sym = event.sym;
        let mut mask_changed = false;
        if self.meta_latched || event.modifiers.intersects(Modifiers::ALT | Modifiers::META) {
            let before = *mask;
            match sym.to_char_code().and_then(|c| u8::try_from(c).ok()) {
                Some(digit @ b'0'..=b'9') => mask.toggle_digit(digit),
                Some(b'c') => mask.toggle(TraceMask::CPU),
                Some(b'e') => mask.toggle(TraceMask::ECS),
                Some(b'x') => mask.toggle_all(),
                Some(b'p') => sym = KeySym::PASTE,
                _ => {}
            }
            mask_changed = *mask != before;
            if mask_changed {
                tracing::info!(mask = %mask.status_string(), "trace mask changed");
            }
        }

        if sym.is_none() || sym == KeySym::ALT_L {
            return Translated {
                queued: None,
                mask_changed,
            };
        }
        ring.enqueue(sym);
        Translated {
            queued: Some(sym),
            mask_changed,
        }
    }
}

/// What to do with a dequeued symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Hand this byte to the engine.
    Send(u8),
    /// Carriage return followed by the settle delay.
    SendReturn,
    Ignore,
    /// Switch the diagnostic level (1..=3).
    ToggleDiagnostics(u8),
    Paste,
}

impl KeyAction {
    pub fn classify(sym: KeySym) -> Self {
        match sym {
            KeySym::LINEFEED => Self::Ignore,
            KeySym::RETURN | KeySym::KP_ENTER => Self::SendReturn,
            KeySym::F1 => Self::ToggleDiagnostics(1),
            KeySym::F2 => Self::ToggleDiagnostics(2),
            KeySym::F3 => Self::ToggleDiagnostics(3),
            KeySym::PASTE => Self::Paste,
            other => other
                .to_char_code()
                .and_then(|c| u8::try_from(c).ok())
                .map_or(Self::Ignore, Self::Send),
        }
    }
}

/// Frame-paced key delivery state.
#[derive(Debug, Clone)]
pub struct KeyPacer {
    send_this_frame: bool,
    settle: u8,
    settle_frames: u8,
}

impl KeyPacer {
    #[must_use]
    pub fn new(settle_frames: u8) -> Self {
        Self {
            send_this_frame: false,
            settle: 0,
            settle_frames,
        }
    }

    /// Frames left before delivery resumes.
    #[inline]
    pub fn settle_remaining(&self) -> u8 {
        self.settle
    }

    /// Advance one frame and dequeue a key if one may be delivered now.
    pub fn next_key(&mut self, ring: &mut KeyRingBuffer, engine_busy: bool) -> Option<KeyAction> {
        self.send_this_frame = !self.send_this_frame;
        if self.settle > 0 {
            self.settle -= 1;
            return None;
        }
        if ring.is_empty() || engine_busy || !self.send_this_frame {
            return None;
        }
        let action = KeyAction::classify(ring.dequeue());
        if action == KeyAction::SendReturn {
            self.settle = self.settle_frames;
        }
        Some(action)
    }
}
