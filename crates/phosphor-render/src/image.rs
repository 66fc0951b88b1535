#![forbid(unsafe_code)]

//! Window-sized software frame.
//!
//! Everything is drawn into a [`LogicalImage`] first; the frame pool copies
//! the finished image into a shared-memory buffer for presentation. The
//! image persists across frames so that [`LogicalImage::decay`] can fade the
//! previous contents instead of clearing them.
//!
//! # Failure Modes
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Zero width or height | [`ImageError::EmptySize`] |
//! | Byte size overflows `usize` | [`ImageError::TooLarge`] |
//! | Allocator refuses the request | [`ImageError::AllocationFailed`] |

use crate::pixel::PixelArgb;
use phosphor_core::geometry::Size;
use std::fmt;

/// Errors creating or resizing a [`LogicalImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    EmptySize(Size),
    TooLarge(Size),
    AllocationFailed { bytes: usize },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySize(s) => write!(f, "image size {}x{} is empty", s.width, s.height),
            Self::TooLarge(s) => write!(f, "image size {}x{} overflows", s.width, s.height),
            Self::AllocationFailed { bytes } => {
                write!(f, "failed to allocate {bytes} bytes of image memory")
            }
        }
    }
}

impl std::error::Error for ImageError {}

/// Row-major ARGB pixels covering the whole window.
#[derive(Clone, PartialEq, Eq)]
pub struct LogicalImage {
    size: Size,
    pixels: Vec<PixelArgb>,
}

impl LogicalImage {
    /// Allocate an opaque black image.
    pub fn try_new(size: Size) -> Result<Self, ImageError> {
        if size.is_empty() {
            return Err(ImageError::EmptySize(size));
        }
        let count = (size.width as usize)
            .checked_mul(size.height as usize)
            .filter(|n| n.checked_mul(4).is_some())
            .ok_or(ImageError::TooLarge(size))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|_| ImageError::AllocationFailed { bytes: count * 4 })?;
        pixels.resize(count, PixelArgb::BLACK);
        Ok(Self { size, pixels })
    }

    /// New image of `size` holding the overlapping top-left rectangle of
    /// `self`; the rest is black.
    pub fn resized(&self, size: Size) -> Result<Self, ImageError> {
        let mut next = Self::try_new(size)?;
        let common = self.size.overlap(size);
        let w = common.width as usize;
        for row in 0..common.height as usize {
            let src = row * self.size.width as usize;
            let dst = row * size.width as usize;
            next.pixels[dst..dst + w].copy_from_slice(&self.pixels[src..src + w]);
        }
        Ok(next)
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.size.width as usize * 4
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    /// Pixel at `(x, y)`, `None` off-image.
    pub fn get(&self, x: i32, y: i32) -> Option<PixelArgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Mutable pixel at `(x, y)`, `None` off-image.
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut PixelArgb> {
        self.index(x, y).map(|i| &mut self.pixels[i])
    }

    /// Store `px` at `(x, y)`; off-image writes are dropped.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, px: PixelArgb) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = px;
                true
            }
            None => false,
        }
    }

    /// Fade every pixel: green channel shifted right by two.
    pub fn decay(&mut self) {
        for px in &mut self.pixels {
            *px = px.decayed();
        }
    }

    /// Reset to opaque black.
    pub fn clear(&mut self) {
        self.pixels.fill(PixelArgb::BLACK);
    }

    pub fn pixels(&self) -> &[PixelArgb] {
        &self.pixels
    }

    /// Raw little-endian `ARGB8888` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Number of pixels with a non-zero green channel.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|px| px.green() != 0).count()
    }
}

impl fmt::Debug for LogicalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalImage")
            .field("size", &self.size)
            .field("lit", &self.lit_pixels())
            .finish()
    }
}
