//! Glyph cache behaviour through the public API.

use phosphor_core::command_queue::FontSize;
use phosphor_core::geometry::{PenPosition, Size};
use phosphor_render::builtin_face::BuiltinFace;
use phosphor_render::font::{ConsoleFont, FontError, GlyphRasterizer};
use phosphor_render::gamma::GammaTable;
use phosphor_render::glyph::{GlyphBitmap, GlyphMetrics, RasterizedGlyph};
use phosphor_render::image::LogicalImage;
use phosphor_render::raster::draw_character;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps the built-in face and counts backend calls.
struct Counting {
    inner: BuiltinFace,
    calls: Arc<AtomicUsize>,
}

impl GlyphRasterizer for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn is_fixed_width(&self) -> bool {
        true
    }

    fn line_height(&self) -> i32 {
        self.inner.line_height()
    }

    fn rasterize(&mut self, code: u32) -> Result<RasterizedGlyph, FontError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rasterize(code)
    }
}

/// A face whose advance varies with the character.
struct Proportional;

impl GlyphRasterizer for Proportional {
    fn name(&self) -> &str {
        "proportional"
    }

    fn is_fixed_width(&self) -> bool {
        false
    }

    fn line_height(&self) -> i32 {
        12 << 6
    }

    fn rasterize(&mut self, code: u32) -> Result<RasterizedGlyph, FontError> {
        Ok(RasterizedGlyph {
            bitmap: GlyphBitmap::empty(),
            metrics: GlyphMetrics {
                left: 0,
                top: 0,
                advance_x: (code as i32 % 7) << 6,
            },
        })
    }
}

fn counting_font() -> (ConsoleFont, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let face = Counting {
        inner: BuiltinFace::new(1),
        calls: calls.clone(),
    };
    (ConsoleFont::load(Box::new(face), FontSize::Small).unwrap(), calls)
}

#[test]
fn repeated_draws_rasterize_once() {
    let (mut font, calls) = counting_font();
    let gamma = GammaTable::default();
    let mut first = LogicalImage::try_new(Size::new(32, 16)).unwrap();
    let mut second = first.clone();
    let before = calls.load(Ordering::SeqCst);

    draw_character(&mut first, &gamma, &mut font, u32::from(b'Q'), PenPosition::ORIGIN).unwrap();
    draw_character(&mut second, &gamma, &mut font, u32::from(b'Q'), PenPosition::ORIGIN).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst) - before, 1);
    assert_eq!(first, second, "cached glyph renders identically");
}

#[test]
fn cached_bitmap_is_bit_identical() {
    let (mut font, _) = counting_font();
    let a = font.glyph(u32::from(b'#')).unwrap().into_owned();
    let b = font.glyph(u32::from(b'#')).unwrap().into_owned();
    assert_eq!(a, b);
    assert_eq!(font.stats().hits, 1);
}

#[test]
fn proportional_faces_are_refused() {
    let err = ConsoleFont::load(Box::new(Proportional), FontSize::Large).unwrap_err();
    assert!(matches!(err, FontError::NotMonospace { .. }));
    assert!(err.to_string().contains("proportional"));
}
