#![forbid(unsafe_code)]

//! Display-server events.
//!
//! The compositor session delivers everything the console reacts to as a
//! [`DisplayEvent`]: frame completion, size hints, configure acknowledgements,
//! close requests, buffer releases and decoded keys. The render context
//! consumes them one at a time.
//!
//! # Design
//!
//! - Key events carry already-decoded [`KeySym`]s; keymap handling lives
//!   in the server implementation.
//! - [`Modifiers`] use bitflags so chords can be tested with `intersects`.

use crate::keysym::KeySym;
use bitflags::bitflags;

/// Handle of a presentable buffer created by the display server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

bitflags! {
    /// Modifier keys effective during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyState {
    #[default]
    Pressed,
    Released,
}

/// A decoded key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub sym: KeySym,
    pub state: KeyState,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A release of `sym` with no modifiers.
    #[must_use]
    pub const fn released(sym: KeySym) -> Self {
        Self {
            sym,
            state: KeyState::Released,
            modifiers: Modifiers::NONE,
        }
    }

    /// A press of `sym` with no modifiers.
    #[must_use]
    pub const fn pressed(sym: KeySym) -> Self {
        Self {
            sym,
            state: KeyState::Pressed,
            modifiers: Modifiers::NONE,
        }
    }

    /// Shorthand for a printable character release.
    #[must_use]
    pub fn char(c: char) -> Self {
        Self::released(KeySym::from_char_code(u32::from(c)))
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[inline]
    pub const fn is_release(&self) -> bool {
        matches!(self.state, KeyState::Released)
    }
}

/// Everything the display server can tell the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// The previous frame was shown; `time_ms` is the server timestamp.
    FrameDone { time_ms: u32 },
    /// Toplevel size hint. Zero in either axis means "client decides".
    Configure { width: u32, height: u32 },
    /// Surface configure that must be acknowledged.
    SurfaceConfigure { serial: u32 },
    /// The user asked to close the window.
    Close,
    /// The server no longer reads from this buffer.
    BufferRelease(BufferId),
    /// A decoded key transition.
    Key(KeyEvent),
    /// Keyboard focus left the surface.
    KeyboardLeave,
}

impl DisplayEvent {
    /// Short name used in log fields.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FrameDone { .. } => "frame_done",
            Self::Configure { .. } => "configure",
            Self::SurfaceConfigure { .. } => "surface_configure",
            Self::Close => "close",
            Self::BufferRelease(_) => "buffer_release",
            Self::Key(_) => "key",
            Self::KeyboardLeave => "keyboard_leave",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_builders() {
        let ev = KeyEvent::char('p').with_modifiers(Modifiers::ALT);
        assert!(ev.is_release());
        assert_eq!(ev.sym, KeySym(u32::from(b'p')));
        assert!(ev.modifiers.contains(Modifiers::ALT));
        assert!(!KeyEvent::pressed(KeySym::META_L).is_release());
    }

    #[test]
    fn modifiers_default_to_none() {
        assert_eq!(Modifiers::default(), Modifiers::NONE);
        assert!(Modifiers::default().is_empty());
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(DisplayEvent::Close.as_str(), "close");
        assert_eq!(
            DisplayEvent::FrameDone { time_ms: 1 }.as_str(),
            "frame_done"
        );
        assert_eq!(
            DisplayEvent::BufferRelease(BufferId(3)).as_str(),
            "buffer_release"
        );
    }
}
