#![forbid(unsafe_code)]

//! The three console fonts.

use phosphor_core::command_queue::FontSize;
use phosphor_core::config::ConsoleConfig;
use phosphor_render::builtin_face::BuiltinFace;
use phosphor_render::font::{ConsoleFont, FontError, GlyphRasterizer, points_to_pixels};
use phosphor_render::locator::{FcMatchLocator, FixedLocator, FontLocator};

/// Small, medium and large faces, indexed by [`FontSize`].
#[derive(Debug)]
pub struct FontSet {
    small: ConsoleFont,
    medium: ConsoleFont,
    large: ConsoleFont,
}

impl FontSet {
    pub fn new(small: ConsoleFont, medium: ConsoleFont, large: ConsoleFont) -> Self {
        Self {
            small,
            medium,
            large,
        }
    }

    /// Fonts described by `config`: the built-in face, a configured file or
    /// a fontconfig match.
    pub fn load(config: &ConsoleConfig) -> Result<Self, FontError> {
        if config.builtin_font {
            return Self::builtin(config);
        }
        match &config.font_path {
            Some(path) => Self::load_with(config, &FixedLocator::new(path)),
            None => Self::load_with(config, &FcMatchLocator::new(config.dpi)),
        }
    }

    /// Built-in bitmap face at the configured point sizes.
    pub fn builtin(config: &ConsoleConfig) -> Result<Self, FontError> {
        let face = |points: u32| -> Box<dyn GlyphRasterizer> {
            Box::new(BuiltinFace::for_pixel_size(points_to_pixels(
                points, config.dpi,
            )))
        };
        let p = &config.font_points;
        Ok(Self::new(
            ConsoleFont::load(face(p.small), FontSize::Small)?,
            ConsoleFont::load(face(p.medium), FontSize::Medium)?,
            ConsoleFont::load(face(p.large), FontSize::Large)?,
        ))
    }

    /// Resolve each size through `locator`, falling back to the configured
    /// fallback family.
    #[cfg(feature = "fontdue")]
    pub fn load_with(config: &ConsoleConfig, locator: &dyn FontLocator) -> Result<Self, FontError> {
        use phosphor_render::fontdue_face::FontdueFace;
        use phosphor_render::locator::locate_with_fallback;

        let load = |points: u32, size: FontSize| -> Result<ConsoleFont, FontError> {
            let path = locate_with_fallback(
                locator,
                &config.font_family,
                &config.fallback_family,
                points,
            )?;
            let face = FontdueFace::from_path(&path, points, config.dpi)?;
            ConsoleFont::load(Box::new(face), size)
        };
        let p = &config.font_points;
        Ok(Self::new(
            load(p.small, FontSize::Small)?,
            load(p.medium, FontSize::Medium)?,
            load(p.large, FontSize::Large)?,
        ))
    }

    #[cfg(not(feature = "fontdue"))]
    pub fn load_with(config: &ConsoleConfig, _locator: &dyn FontLocator) -> Result<Self, FontError> {
        tracing::warn!("built without font file support, using the built-in face");
        Self::builtin(config)
    }

    /// Font for `size`; `None` for [`FontSize::Dot`].
    pub fn get_mut(&mut self, size: FontSize) -> Option<&mut ConsoleFont> {
        match size {
            FontSize::Dot => None,
            FontSize::Small => Some(&mut self.small),
            FontSize::Medium => Some(&mut self.medium),
            FontSize::Large => Some(&mut self.large),
        }
    }
}
