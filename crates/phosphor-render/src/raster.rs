#![forbid(unsafe_code)]

//! Drawing glyphs and points into the logical image.
//!
//! # Placement
//!
//! A glyph's bitmap lands at `pen + bearing`. The pen's `y` is the top of the
//! text line, so glyphs with a non-negative top bearing are pushed down by
//! `line_height - top`; a negative top bearing is used as-is.
//!
//! # Invariants
//!
//! - Pixels outside the image are dropped one by one; the rest of the glyph is
//!   still drawn.
//! - The returned pen is `pen.x + advance`, or the start of the next line
//!   when that column is at or beyond the image width.
//!
//! # Pixel encodings
//!
//! | Bitmap | Effect on green |
//! |--------|-----------------|
//! | `Gray8` | gamma-corrected coverage blended over the current value |
//! | `Mono1` | set bits light fully, clear bits go dark |

use crate::font::{ConsoleFont, FontError};
use crate::gamma::GammaTable;
use crate::glyph::BitmapFormat;
use crate::image::LogicalImage;
use crate::pixel::PixelArgb;
use phosphor_core::geometry::{PEN_FRACT_BITS, PenPosition};

/// Draw `code` at `pen` and return the pen for the following character.
pub fn draw_character(
    image: &mut LogicalImage,
    gamma: &GammaTable,
    font: &mut ConsoleFont,
    code: u32,
    pen: PenPosition,
) -> Result<PenPosition, FontError> {
    let line_height = font.line_height();
    let glyph = font.glyph(code)?;
    let bitmap = &glyph.bitmap;
    let metrics = glyph.metrics;

    let x = pen.pixel_x() + metrics.left;
    let y = if metrics.top < 0 {
        pen.pixel_y() - metrics.top
    } else {
        pen.pixel_y() + ((line_height >> PEN_FRACT_BITS) - metrics.top)
    };

    let mut clipped = 0usize;
    for row in 0..bitmap.rows() {
        for col in 0..bitmap.width() {
            let Some(px) = image.get_mut(x + col as i32, y + row as i32) else {
                clipped += 1;
                continue;
            };
            let coverage = bitmap.coverage(col, row);
            *px = match bitmap.format() {
                BitmapFormat::Gray8 => px.blend_green(gamma.apply(coverage)),
                BitmapFormat::Mono1 => px.with_green(coverage).opaque(),
            };
        }
    }
    if clipped > 0 {
        tracing::trace!(code, x, y, clipped, "glyph partly off-image");
    }

    let mut next = PenPosition::new(pen.x + metrics.advance_x, pen.y);
    if next.pixel_x() >= image.width() as i32 {
        next = PenPosition::new(0, pen.y + line_height);
    }
    Ok(next)
}

/// Light the single pixel under `pen`. Returns `false` when off-image.
pub fn draw_point(image: &mut LogicalImage, pen: PenPosition) -> bool {
    image.put(pen.pixel_x(), pen.pixel_y(), PixelArgb::GREEN)
}

/// Draw a run of single-byte characters starting at `pen`.
///
/// Characters that fail to rasterize are skipped without moving the pen.
pub fn draw_string(
    image: &mut LogicalImage,
    gamma: &GammaTable,
    font: &mut ConsoleFont,
    text: &[u8],
    pen: PenPosition,
) -> PenPosition {
    text.iter().fold(pen, |pen, &byte| {
        draw_character(image, gamma, font, u32::from(byte), pen).unwrap_or_else(|err| {
            tracing::debug!(byte, error = %err, "skipping character");
            pen
        })
    })
}
