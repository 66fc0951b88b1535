#![forbid(unsafe_code)]

//! Emulator trace selection toggled from the console keyboard.
//!
//! Bits 0..=9 select peripheral processors, bit 14 the CPU and bit 15 the
//! extended core storage. The console only flips bits; the emulation engine
//! reads the mask through [`crate::link::DisplayLink::trace_mask`].

use bitflags::bitflags;

bitflags! {
    /// Active trace channels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TraceMask: u32 {
        const PP0 = 1 << 0;
        const PP1 = 1 << 1;
        const PP2 = 1 << 2;
        const PP3 = 1 << 3;
        const PP4 = 1 << 4;
        const PP5 = 1 << 5;
        const PP6 = 1 << 6;
        const PP7 = 1 << 7;
        const PP8 = 1 << 8;
        const PP9 = 1 << 9;
        const CPU = 1 << 14;
        const ECS = 1 << 15;
    }
}

impl TraceMask {
    /// Toggle the processor selected by an ASCII digit. Non-digits are ignored.
    pub fn toggle_digit(&mut self, digit: u8) {
        if digit.is_ascii_digit() {
            *self ^= Self::from_bits_retain(1 << (digit - b'0'));
        }
    }

    /// Everything on when empty, otherwise everything off.
    pub fn toggle_all(&mut self) {
        *self = if self.is_empty() {
            Self::from_bits_retain(u32::MAX)
        } else {
            Self::empty()
        };
    }

    /// One character per channel, `_` when off: `0123456789CE`.
    #[must_use]
    pub fn status_string(self) -> String {
        let mut out = String::with_capacity(12);
        for n in 0..10u8 {
            let on = self.bits() & (1 << n) != 0;
            out.push(if on { char::from(b'0' + n) } else { '_' });
        }
        out.push(if self.contains(Self::CPU) { 'C' } else { '_' });
        out.push(if self.contains(Self::ECS) { 'E' } else { '_' });
        out
    }
}
