#![forbid(unsafe_code)]

//! Scalable TTF/OTF faces via `fontdue`.

use crate::font::{FontError, GlyphRasterizer, points_to_pixels};
use crate::glyph::{GlyphBitmap, GlyphMetrics, RasterizedGlyph};
use fontdue::{Font, FontSettings};
use std::path::Path;

/// Characters whose advances must agree for a face to count as monospace.
const PROBE_CHARS: [char; 4] = ['i', 'M', 'W', '.'];

/// An outline face rendered at one pixel size to 8-bit coverage.
pub struct FontdueFace {
    font: Font,
    px: f32,
    name: String,
    fixed_width: bool,
    line_height: i32,
}

impl FontdueFace {
    /// Parse `data` and prepare it for rendering at `px` pixels per em.
    pub fn from_bytes(data: &[u8], px: f32, name: impl Into<String>) -> Result<Self, FontError> {
        let font = Font::from_bytes(
            data,
            FontSettings {
                scale: px,
                ..FontSettings::default()
            },
        )
        .map_err(|msg| FontError::Parse(msg.to_string()))?;

        let advances: Vec<f32> = PROBE_CHARS
            .iter()
            .map(|&c| font.metrics(c, px).advance_width)
            .collect();
        let fixed_width = advances.windows(2).all(|w| (w[0] - w[1]).abs() < 0.01);

        let line = font
            .horizontal_line_metrics(px)
            .map_or(px * 1.2, |m| m.new_line_size);
        let line_height = (line * 64.0).round() as i32;

        let name = font
            .name()
            .map_or_else(|| name.into(), ToString::to_string);
        Ok(Self {
            font,
            px,
            name,
            fixed_width,
            line_height,
        })
    }

    /// Load a font file at `points` for a display of `dpi`.
    pub fn from_path(path: &Path, points: u32, dpi: u32) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let px = points_to_pixels(points, dpi);
        tracing::debug!(path = %path.display(), points, px, "loading font file");
        Self::from_bytes(&data, px, path.display().to_string())
    }

    /// Pixels per em.
    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.px
    }
}

impl GlyphRasterizer for FontdueFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_fixed_width(&self) -> bool {
        self.fixed_width
    }

    fn line_height(&self) -> i32 {
        self.line_height
    }

    fn rasterize(&mut self, code: u32) -> Result<RasterizedGlyph, FontError> {
        let ch = char::from_u32(code).ok_or(FontError::MissingGlyph(code))?;
        let (m, coverage) = self.font.rasterize(ch, self.px);
        let width = u32::try_from(m.width).map_err(|_| FontError::MissingGlyph(code))?;
        let rows = u32::try_from(m.height).map_err(|_| FontError::MissingGlyph(code))?;
        let bitmap = if width == 0 || rows == 0 {
            GlyphBitmap::empty()
        } else {
            GlyphBitmap::gray(width, rows, coverage)?
        };
        Ok(RasterizedGlyph {
            bitmap,
            metrics: GlyphMetrics {
                left: m.xmin,
                top: m.ymin + rows as i32,
                advance_x: (m.advance_width * 64.0).round() as i32,
            },
        })
    }
}

impl std::fmt::Debug for FontdueFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueFace")
            .field("name", &self.name)
            .field("px", &self.px)
            .field("fixed_width", &self.fixed_width)
            .finish()
    }
}
