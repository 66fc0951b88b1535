#![forbid(unsafe_code)]

//! Built-in 8x8 bitmap face.
//!
//! Uses the `font8x8` tables, so the console can start without any font
//! files installed. The native strike is 8 pixels; larger sizes are integer
//! multiples of it, producing 1-bit bitmaps.

use crate::font::{FontError, GlyphRasterizer};
use crate::glyph::{BitmapFormat, GlyphBitmap, GlyphMetrics, RasterizedGlyph};
use font8x8::{BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, LATIN_FONTS, UnicodeFonts};

/// Native strike height and width in pixels.
pub const STRIKE: u32 = 8;

/// Largest integer scale (a 256 pixel cell).
pub const MAX_SCALE: u32 = 32;

/// The `font8x8` face scaled by an integer factor.
#[derive(Debug, Clone)]
pub struct BuiltinFace {
    scale: u32,
    name: String,
}

impl BuiltinFace {
    /// Face scaled by `scale`, clamped to `1..=MAX_SCALE`.
    #[must_use]
    pub fn new(scale: u32) -> Self {
        let scale = scale.clamp(1, MAX_SCALE);
        Self {
            scale,
            name: format!("builtin-8x8@{scale}x"),
        }
    }

    /// Closest integer multiple of the native strike to `pixels`.
    #[must_use]
    pub fn for_pixel_size(pixels: f32) -> Self {
        let scale = (pixels / STRIKE as f32).round();
        Self::new(if scale.is_finite() && scale >= 1.0 {
            scale.min(MAX_SCALE as f32) as u32
        } else {
            1
        })
    }

    #[inline]
    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn cell(&self) -> u32 {
        STRIKE * self.scale
    }

    fn lookup(ch: char) -> Option<[u8; 8]> {
        BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BOX_FONTS.get(ch))
            .or_else(|| BLOCK_FONTS.get(ch))
    }

    /// Scale one 8x8 glyph (LSB is the leftmost pixel) into MSB-first rows.
    fn expand(&self, rows: [u8; 8]) -> Vec<u8> {
        let cell = self.cell() as usize;
        let pitch = BitmapFormat::Mono1.min_pitch(self.cell());
        let mut out = vec![0u8; pitch * cell];
        for (src_row, &bits) in rows.iter().enumerate() {
            for src_col in 0..STRIKE as usize {
                if (bits >> src_col) & 1 == 0 {
                    continue;
                }
                for dy in 0..self.scale as usize {
                    let row = src_row * self.scale as usize + dy;
                    for dx in 0..self.scale as usize {
                        let col = src_col * self.scale as usize + dx;
                        out[row * pitch + col / 8] |= 0x80 >> (col % 8);
                    }
                }
            }
        }
        out
    }
}

impl Default for BuiltinFace {
    fn default() -> Self {
        Self::new(1)
    }
}

impl GlyphRasterizer for BuiltinFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_fixed_width(&self) -> bool {
        true
    }

    fn line_height(&self) -> i32 {
        (self.cell() as i32) << 6
    }

    fn rasterize(&mut self, code: u32) -> Result<RasterizedGlyph, FontError> {
        let ch = char::from_u32(code).ok_or(FontError::MissingGlyph(code))?;
        let cell = self.cell();
        let metrics = GlyphMetrics {
            left: 0,
            top: cell as i32,
            advance_x: (cell as i32) << 6,
        };
        let bitmap = match Self::lookup(ch) {
            Some(rows) => GlyphBitmap::new(
                cell,
                cell,
                BitmapFormat::Mono1.min_pitch(cell),
                BitmapFormat::Mono1,
                self.expand(rows),
            )?,
            None => GlyphBitmap::empty(),
        };
        Ok(RasterizedGlyph { bitmap, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(glyph: &RasterizedGlyph) -> usize {
        let bm = &glyph.bitmap;
        (0..bm.rows())
            .flat_map(|r| (0..bm.width()).map(move |c| (c, r)))
            .filter(|&(c, r)| bm.coverage(c, r) != 0)
            .count()
    }

    #[test]
    fn builtin_face_is_fixed_width() {
        let mut face = BuiltinFace::default();
        assert!(face.is_fixed_width());
        let a = face.rasterize(u32::from('i')).unwrap();
        let b = face.rasterize(u32::from('W')).unwrap();
        assert_eq!(a.metrics.advance_x, b.metrics.advance_x);
        assert_eq!(a.metrics.advance_x, 8 << 6);
    }

    #[test]
    fn space_is_blank_and_letters_are_not() {
        let mut face = BuiltinFace::default();
        assert_eq!(lit(&face.rasterize(u32::from(' ')).unwrap()), 0);
        assert!(lit(&face.rasterize(u32::from('A')).unwrap()) > 0);
    }

    #[test]
    fn scaling_multiplies_lit_area() {
        let mut one = BuiltinFace::new(1);
        let mut three = BuiltinFace::new(3);
        let small = one.rasterize(u32::from('A')).unwrap();
        let large = three.rasterize(u32::from('A')).unwrap();
        assert_eq!(large.bitmap.width(), 24);
        assert_eq!(large.bitmap.pitch(), 3);
        assert_eq!(lit(&large), lit(&small) * 9);
    }

    #[test]
    fn lsb_source_becomes_msb_first() {
        let face = BuiltinFace::new(1);
        let rows = [0x01, 0x80, 0, 0, 0, 0, 0, 0];
        let out = face.expand(rows);
        assert_eq!(out[0], 0x80);
        assert_eq!(out[1], 0x01);
    }

    #[test]
    fn pixel_size_snaps_to_strike_multiples() {
        assert_eq!(BuiltinFace::for_pixel_size(10.4).scale(), 1);
        assert_eq!(BuiltinFace::for_pixel_size(20.8).scale(), 3);
        assert_eq!(BuiltinFace::for_pixel_size(2.0).scale(), 1);
    }

    #[test]
    fn huge_sizes_are_clamped() {
        let mut face = BuiltinFace::for_pixel_size(4.0e9);
        assert_eq!(face.scale(), MAX_SCALE);
        assert_eq!(BuiltinFace::new(u32::MAX).scale(), MAX_SCALE);
        let glyph = face.rasterize(u32::from('A')).unwrap();
        assert_eq!(glyph.bitmap.width(), STRIKE * MAX_SCALE);
    }

    #[test]
    fn surrogate_codes_are_missing() {
        let mut face = BuiltinFace::default();
        assert!(matches!(
            face.rasterize(0xd800),
            Err(FontError::MissingGlyph(0xd800))
        ));
    }
}
