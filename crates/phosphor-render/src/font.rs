#![forbid(unsafe_code)]

//! Console fonts and the glyph cache.
//!
//! A [`ConsoleFont`] pairs a [`GlyphRasterizer`] backend with an append-only
//! cache for character codes below 256. The cache is filled lazily the first
//! time a code is drawn and lives as long as the font; larger codes are
//! rasterized on every use.
//!
//! Only fixed-width faces are accepted: backspace and overstrike on the
//! console assume every cell has the same advance.

use crate::glyph::RasterizedGlyph;
use phosphor_core::command_queue::FontSize;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Codes below this bound are cached.
pub const CACHED_CODES: usize = 256;

/// Errors from loading fonts or rasterizing glyphs.
#[derive(Debug)]
pub enum FontError {
    /// The face has per-glyph advances.
    NotMonospace { name: String },
    /// Reading the font file failed.
    Io { path: PathBuf, source: io::Error },
    /// The font data could not be parsed.
    Parse(String),
    /// No font matched the requested family.
    NotFound { family: String },
    /// The face has no glyph for this code.
    MissingGlyph(u32),
    /// Bitmap dimensions disagree with its data.
    InvalidBitmap {
        width: u32,
        rows: u32,
        pitch: usize,
        len: usize,
    },
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMonospace { name } => write!(f, "font {name} is not fixed width"),
            Self::Io { path, source } => write!(f, "reading {}: {source}", path.display()),
            Self::Parse(msg) => write!(f, "font parse error: {msg}"),
            Self::NotFound { family } => write!(f, "no font found for family {family:?}"),
            Self::MissingGlyph(code) => write!(f, "no glyph for code {code:#x}"),
            Self::InvalidBitmap {
                width,
                rows,
                pitch,
                len,
            } => write!(
                f,
                "invalid glyph bitmap {width}x{rows} pitch {pitch} with {len} bytes"
            ),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A face that can turn character codes into bitmaps.
pub trait GlyphRasterizer: Send {
    /// Human readable face name for logs.
    fn name(&self) -> &str;

    /// True when every glyph shares one advance.
    fn is_fixed_width(&self) -> bool;

    /// Baseline-to-baseline distance in 26.6 fixed point.
    fn line_height(&self) -> i32;

    /// Render one glyph.
    fn rasterize(&mut self, code: u32) -> Result<RasterizedGlyph, FontError>;
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Codes at or above [`CACHED_CODES`] rendered without caching.
    pub uncached: u64,
    /// Glyphs currently held.
    pub cached: usize,
}

impl GlyphCacheStats {
    /// Calls made into the backend.
    #[inline]
    pub fn rasterizations(&self) -> u64 {
        self.misses + self.uncached
    }
}

/// A loaded console face with its glyph cache.
pub struct ConsoleFont {
    face: Box<dyn GlyphRasterizer>,
    size: FontSize,
    line_height: i32,
    bs_advance: i32,
    cache: Vec<Option<RasterizedGlyph>>,
    stats: GlyphCacheStats,
}

impl ConsoleFont {
    /// Wrap `face` for console `size`.
    ///
    /// Rejects proportional faces and primes the cache with `'w'`, whose
    /// advance becomes the backspace distance.
    pub fn load(face: Box<dyn GlyphRasterizer>, size: FontSize) -> Result<Self, FontError> {
        if !face.is_fixed_width() {
            tracing::warn!(face = face.name(), size = size.as_str(), "rejecting proportional font");
            return Err(FontError::NotMonospace {
                name: face.name().to_string(),
            });
        }
        let line_height = face.line_height();
        let mut font = Self {
            face,
            size,
            line_height,
            bs_advance: 0,
            cache: vec![None; CACHED_CODES],
            stats: GlyphCacheStats::default(),
        };
        font.bs_advance = font.glyph(u32::from(b'w'))?.metrics.advance_x;
        tracing::debug!(
            face = font.face.name(),
            size = size.as_str(),
            line_height = line_height >> 6,
            bs_advance = font.bs_advance >> 6,
            "font loaded"
        );
        Ok(font)
    }

    /// Glyph for `code`, from the cache when possible.
    pub fn glyph(&mut self, code: u32) -> Result<Cow<'_, RasterizedGlyph>, FontError> {
        let idx = match usize::try_from(code) {
            Ok(idx) if idx < CACHED_CODES => idx,
            _ => {
                self.stats.uncached += 1;
                return self.face.rasterize(code).map(Cow::Owned);
            }
        };
        let slot = &mut self.cache[idx];
        let glyph = match slot.take() {
            Some(glyph) => {
                self.stats.hits += 1;
                glyph
            }
            None => {
                let glyph = self.face.rasterize(code)?;
                self.stats.misses += 1;
                self.stats.cached += 1;
                tracing::trace!(code, face = self.face.name(), "glyph cached");
                glyph
            }
        };
        Ok(Cow::Borrowed(slot.insert(glyph)))
    }

    /// True when `code` is already cached.
    pub fn is_cached(&self, code: u32) -> bool {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.cache.get(idx))
            .is_some_and(Option::is_some)
    }

    #[inline]
    pub fn size(&self) -> FontSize {
        self.size
    }

    /// Line height in 26.6.
    #[inline]
    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    /// Advance of `'w'` in 26.6.
    #[inline]
    pub fn bs_advance(&self) -> i32 {
        self.bs_advance
    }

    #[inline]
    pub fn stats(&self) -> GlyphCacheStats {
        self.stats
    }

    pub fn name(&self) -> &str {
        self.face.name()
    }
}

impl fmt::Debug for ConsoleFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleFont")
            .field("face", &self.face.name())
            .field("size", &self.size)
            .field("line_height", &self.line_height)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Pixel size for `points` at `dpi`.
#[inline]
pub fn points_to_pixels(points: u32, dpi: u32) -> f32 {
    points as f32 * dpi as f32 / 72.0
}


#[cfg(test)]
mod tests {
    use super::test_support::BlockFace;
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn load_rejects_proportional_faces() {
        let mut face = BlockFace::new(4, 6);
        face.fixed = false;
        let err = ConsoleFont::load(Box::new(face), FontSize::Small).unwrap_err();
        assert!(matches!(err, FontError::NotMonospace { .. }));
    }

    #[test]
    fn load_records_backspace_advance() {
        let font = ConsoleFont::load(Box::new(BlockFace::new(5, 7)), FontSize::Small).unwrap();
        assert_eq!(font.bs_advance(), 5 << 6);
        assert!(font.is_cached(u32::from(b'w')));
        assert_eq!(font.stats().cached, 1);
    }

    #[test]
    fn second_lookup_hits_cache() {
        let face = BlockFace::new(3, 3);
        let calls = face.calls.clone();
        let mut font = ConsoleFont::load(Box::new(face), FontSize::Medium).unwrap();
        let before = calls.load(Ordering::Relaxed);

        let first = font.glyph(u32::from(b'A')).unwrap().into_owned();
        let second = font.glyph(u32::from(b'A')).unwrap().into_owned();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::Relaxed) - before, 1);
        assert_eq!(font.stats().hits, 1);
    }

    #[test]
    fn large_codes_are_not_cached() {
        let face = BlockFace::new(2, 2);
        let calls = face.calls.clone();
        let mut font = ConsoleFont::load(Box::new(face), FontSize::Large).unwrap();
        let before = calls.load(Ordering::Relaxed);
        let _ = font.glyph(0x263a).unwrap();
        let _ = font.glyph(0x263a).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed) - before, 2);
        assert!(!font.is_cached(0x263a));
        assert_eq!(font.stats().uncached, 2);
        assert_eq!(font.stats().rasterizations(), 3);
    }

    #[test]
    fn points_convert_at_dpi() {
        assert!((points_to_pixels(72, 75) - 75.0).abs() < f32::EPSILON);
        assert!((points_to_pixels(10, 72) - 10.0).abs() < f32::EPSILON);
    }
}
