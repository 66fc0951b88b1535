#![forbid(unsafe_code)]

//! Packed ARGB pixel.
//!
//! The display server consumes little-endian `ARGB8888`, i.e. one `u32` per
//! pixel with alpha in the top byte. Only the green channel carries the
//! picture; red and blue stay zero and alpha stays opaque.

use bytemuck::{Pod, Zeroable};

/// One `ARGB8888` pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct PixelArgb(pub u32);

impl PixelArgb {
    /// Opaque black, the background colour.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Fully lit phosphor.
    pub const GREEN: Self = Self(0xFF00_FF00);

    const GREEN_SHIFT: u32 = 8;
    const GREEN_MASK: u32 = 0xFF << Self::GREEN_SHIFT;

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        (self.0 >> Self::GREEN_SHIFT) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Same pixel with the green channel replaced.
    #[inline]
    #[must_use]
    pub const fn with_green(self, green: u8) -> Self {
        Self((self.0 & !Self::GREEN_MASK) | ((green as u32) << Self::GREEN_SHIFT))
    }

    /// Green channel divided by four.
    #[inline]
    #[must_use]
    pub const fn decayed(self) -> Self {
        self.with_green(self.green() >> 2)
    }

    /// Blend `coverage` over the current green value.
    #[inline]
    #[must_use]
    pub const fn blend_green(self, coverage: u8) -> Self {
        let a = coverage as u32;
        let dst = self.green() as u32;
        let g = a + (dst * (255 - a) + 127) / 255;
        self.with_green(g as u8).opaque()
    }

    #[inline]
    #[must_use]
    pub const fn opaque(self) -> Self {
        Self(self.0 | 0xFF00_0000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_accessors() {
        let px = PixelArgb::rgb(0x12, 0x34, 0x56);
        assert_eq!(px.alpha(), 0xFF);
        assert_eq!(px.red(), 0x12);
        assert_eq!(px.green(), 0x34);
        assert_eq!(px.blue(), 0x56);
    }

    #[test]
    fn decay_quarters_green_only() {
        let px = PixelArgb::rgb(9, 200, 7).decayed();
        assert_eq!(px.green(), 50);
        assert_eq!(px.red(), 9);
        assert_eq!(px.blue(), 7);
        assert_eq!(PixelArgb::GREEN.decayed().decayed().decayed().decayed().green(), 0);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(PixelArgb::BLACK.blend_green(255), PixelArgb::GREEN);
        assert_eq!(PixelArgb::BLACK.blend_green(0), PixelArgb::BLACK);
        assert_eq!(PixelArgb::GREEN.blend_green(10).green(), 255);
        let half = PixelArgb::BLACK.blend_green(128);
        assert_eq!(half.green(), 128);
    }

    #[test]
    fn blend_never_darkens() {
        for dst in [0u8, 17, 128, 254] {
            for a in [0u8, 1, 100, 255] {
                let out = PixelArgb::BLACK.with_green(dst).blend_green(a);
                assert!(out.green() >= dst.max(a));
            }
        }
    }
}
