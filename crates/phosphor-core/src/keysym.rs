#![forbid(unsafe_code)]

//! Decoded key symbols.
//!
//! Symbols use the X11/xkb keysym numbering so the input-decoding collaborator
//! can hand them over unchanged. Only the symbols the console reacts to are
//! named here; everything else is carried opaquely and translated through
//! [`KeySym::to_char_code`].

/// An xkb-compatible key symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeySym(pub u32);

impl KeySym {
    /// "No symbol"; also the empty sentinel of the key ring buffer.
    pub const NO_SYMBOL: Self = Self(0);
    pub const BACKSPACE: Self = Self(0xff08);
    pub const TAB: Self = Self(0xff09);
    pub const LINEFEED: Self = Self(0xff0a);
    pub const RETURN: Self = Self(0xff0d);
    pub const ESCAPE: Self = Self(0xff1b);
    pub const DELETE: Self = Self(0xffff);
    pub const KP_ENTER: Self = Self(0xff8d);
    pub const F1: Self = Self(0xffbe);
    pub const F2: Self = Self(0xffbf);
    pub const F3: Self = Self(0xffc0);
    pub const META_L: Self = Self(0xffe7);
    pub const ALT_L: Self = Self(0xffe9);
    /// Borrowed `XF86Paste`: marks a clipboard paste request.
    pub const PASTE: Self = Self(0x1008_ff6d);

    /// Offset applied to code points that have no legacy keysym.
    const UNICODE_OFFSET: u32 = 0x0100_0000;

    /// Raw keysym value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True for [`KeySym::NO_SYMBOL`].
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Map a Unicode scalar to its keysym.
    ///
    /// Printable Latin-1 maps one to one; control characters that have a
    /// dedicated function key map to it; other code points use the Unicode
    /// keysym range. Unmappable input yields [`KeySym::NO_SYMBOL`].
    #[must_use]
    pub fn from_char_code(code: u32) -> Self {
        match code {
            0x08 => Self::BACKSPACE,
            0x09 => Self::TAB,
            0x0a => Self::LINEFEED,
            0x0d => Self::RETURN,
            0x1b => Self::ESCAPE,
            0x7f => Self::DELETE,
            0x20..=0x7e | 0xa0..=0xff => Self(code),
            0x100..=0x10_ffff if char::from_u32(code).is_some() => {
                Self(code + Self::UNICODE_OFFSET)
            }
            _ => Self::NO_SYMBOL,
        }
    }

    /// Character code produced by this symbol, or `None` for keys that do
    /// not produce text (function keys, modifiers, ...).
    #[must_use]
    pub fn to_char_code(self) -> Option<u32> {
        match self {
            Self::BACKSPACE => Some(0x08),
            Self::TAB => Some(0x09),
            Self::LINEFEED => Some(0x0a),
            Self::RETURN | Self::KP_ENTER => Some(0x0d),
            Self::ESCAPE => Some(0x1b),
            Self::DELETE => Some(0x7f),
            Self(code @ (0x20..=0x7e | 0xa0..=0xff)) => Some(code),
            Self(code) if (0x0100_0100..=0x0110_ffff).contains(&code) => {
                Some(code - Self::UNICODE_OFFSET)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_ascii_maps_to_itself() {
        for code in 0x20u32..=0x7e {
            let sym = KeySym::from_char_code(code);
            assert_eq!(sym.raw(), code);
            assert_eq!(sym.to_char_code(), Some(code));
        }
    }

    #[test]
    fn control_characters_use_function_keysyms() {
        assert_eq!(KeySym::from_char_code(0x0d), KeySym::RETURN);
        assert_eq!(KeySym::from_char_code(0x0a), KeySym::LINEFEED);
        assert_eq!(KeySym::RETURN.to_char_code(), Some(0x0d));
    }

    #[test]
    fn unicode_uses_offset_range() {
        let sym = KeySym::from_char_code(0x263a);
        assert_eq!(sym.raw(), 0x0100_263a);
        assert_eq!(sym.to_char_code(), Some(0x263a));
    }

    #[test]
    fn unmappable_codes_yield_no_symbol() {
        assert!(KeySym::from_char_code(0x01).is_none());
        assert!(KeySym::from_char_code(0xd800).is_none());
    }

    #[test]
    fn function_keys_produce_no_text() {
        assert_eq!(KeySym::F1.to_char_code(), None);
        assert_eq!(KeySym::PASTE.to_char_code(), None);
        assert_eq!(KeySym::ALT_L.to_char_code(), None);
    }
}
