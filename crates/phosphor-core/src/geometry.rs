#![forbid(unsafe_code)]

//! Logical console geometry.
//!
//! The emulated console addresses a square grid of `0..=0o777` in both axes.
//! Horizontal positions are used as pixel columns directly; vertical
//! positions go through a [`YOffsetMap`] that stretches the 512 logical rows
//! over the physical window height.
//!
//! Pen positions use 26.6 fixed point (six fractional bits), the unit the
//! glyph rasterizer reports advances and line heights in.

/// Largest logical coordinate on either axis (`0o777`).
pub const LOGICAL_MAX: u16 = 0o777;

/// Number of logical rows/columns (`LOGICAL_MAX + 1`).
pub const LOGICAL_EXTENT: usize = LOGICAL_MAX as usize + 1;

/// Number of fractional bits in a [`PenPosition`] coordinate.
pub const PEN_FRACT_BITS: u32 = 6;

/// Window dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Overlapping top-left rectangle of two sizes.
    #[inline]
    #[must_use]
    pub fn overlap(&self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }
}

/// Sub-pixel pen position in 26.6 fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PenPosition {
    pub x: i32,
    pub y: i32,
}

impl PenPosition {
    /// Pen at the origin.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a pen position from raw 26.6 values.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Create a pen position from whole pixel coordinates.
    #[inline]
    pub const fn from_pixels(x: i32, y: i32) -> Self {
        Self {
            x: x << PEN_FRACT_BITS,
            y: y << PEN_FRACT_BITS,
        }
    }

    /// Whole pixel column (floor).
    #[inline]
    pub const fn pixel_x(&self) -> i32 {
        self.x >> PEN_FRACT_BITS
    }

    /// Whole pixel row (floor).
    #[inline]
    pub const fn pixel_y(&self) -> i32 {
        self.y >> PEN_FRACT_BITS
    }
}

/// Precomputed logical-row to physical-row lookup.
///
/// `map[y] = round(y * height / 0o777)`, so logical row 0 lands on physical
/// row 0 and logical row 0o777 on row `height`, one past the image. Anything
/// drawn on the last logical row is therefore clipped. The table is rebuilt
/// whenever the window height changes.
#[derive(Clone, PartialEq, Eq)]
pub struct YOffsetMap {
    height: u32,
    rows: Box<[u16; LOGICAL_EXTENT]>,
}

impl YOffsetMap {
    /// Build the table for a window of `height` physical rows.
    #[must_use]
    pub fn new(height: u32) -> Self {
        let mut rows = Box::new([0u16; LOGICAL_EXTENT]);
        let factor = height as f32 / f32::from(LOGICAL_MAX);
        for (y, row) in rows.iter_mut().enumerate() {
            let mapped = (factor * y as f32).round();
            *row = mapped.clamp(0.0, f32::from(u16::MAX)) as u16;
        }
        Self { height, rows }
    }

    /// Window height the table was built for.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Physical row for a logical row; rows past `0o777` use the last entry.
    #[inline]
    pub fn row(&self, logical_y: u16) -> u16 {
        let idx = usize::from(logical_y.min(LOGICAL_MAX));
        self.rows[idx]
    }
}

impl std::fmt::Debug for YOffsetMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YOffsetMap")
            .field("height", &self.height)
            .field("first", &self.rows[0])
            .field("last", &self.rows[LOGICAL_EXTENT - 1])
            .finish()
    }
}
