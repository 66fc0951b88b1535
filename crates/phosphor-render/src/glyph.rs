#![forbid(unsafe_code)]

//! Rasterized glyph bitmaps and metrics.
//!
//! Bitmaps come in two encodings: 8-bit coverage from outline fonts and
//! 1-bit rows (most significant bit first) from bitmap fonts. Rows are
//! `pitch` bytes apart, top row first.

use crate::font::FontError;

/// Source pixel encoding of a [`GlyphBitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapFormat {
    /// One coverage byte per pixel.
    Gray8,
    /// One bit per pixel, MSB is the leftmost pixel.
    Mono1,
}

impl BitmapFormat {
    /// Minimum bytes needed for a row of `width` pixels.
    #[inline]
    pub const fn min_pitch(self, width: u32) -> usize {
        match self {
            Self::Gray8 => width as usize,
            Self::Mono1 => (width as usize).div_ceil(8),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gray8 => "gray8",
            Self::Mono1 => "mono1",
        }
    }
}

/// Validated glyph pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    width: u32,
    rows: u32,
    pitch: usize,
    format: BitmapFormat,
    data: Vec<u8>,
}

impl GlyphBitmap {
    /// Wrap raw pixel rows, checking that `data` covers `rows * pitch` bytes.
    pub fn new(
        width: u32,
        rows: u32,
        pitch: usize,
        format: BitmapFormat,
        data: Vec<u8>,
    ) -> Result<Self, FontError> {
        let needed = pitch.checked_mul(rows as usize);
        if pitch < format.min_pitch(width) || needed.is_none_or(|n| data.len() < n) {
            return Err(FontError::InvalidBitmap {
                width,
                rows,
                pitch,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            rows,
            pitch,
            format,
            data,
        })
    }

    /// Tightly packed 8-bit coverage.
    pub fn gray(width: u32, rows: u32, data: Vec<u8>) -> Result<Self, FontError> {
        Self::new(width, rows, width as usize, BitmapFormat::Gray8, data)
    }

    /// A bitmap with no pixels (space and other blank glyphs).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            width: 0,
            rows: 0,
            pitch: 0,
            format: BitmapFormat::Gray8,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn format(&self) -> BitmapFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Coverage of column `col` in row `row`: the byte for `Gray8`, 0 or 255
    /// for `Mono1`.
    #[inline]
    pub fn coverage(&self, col: u32, row: u32) -> u8 {
        let base = row as usize * self.pitch;
        match self.format {
            BitmapFormat::Gray8 => self.data[base + col as usize],
            BitmapFormat::Mono1 => {
                let byte = self.data[base + col as usize / 8];
                if byte & (0x80 >> (col % 8)) != 0 { 255 } else { 0 }
            }
        }
    }
}

/// Placement metrics of one glyph.
///
/// `left`/`top` are the bitmap bearings in whole pixels (top measured up from
/// the baseline); `advance_x` is in 26.6 fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphMetrics {
    pub left: i32,
    pub top: i32,
    pub advance_x: i32,
}

/// Bitmap plus metrics, as returned by a [`crate::font::GlyphRasterizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizedGlyph {
    pub bitmap: GlyphBitmap,
    pub metrics: GlyphMetrics,
}
