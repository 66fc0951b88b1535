#![forbid(unsafe_code)]

//! Resolving font families to files.

use crate::font::FontError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Maps a family name and point size to a font file.
pub trait FontLocator {
    fn locate(&self, family: &str, points: u32) -> Result<PathBuf, FontError>;
}

/// Asks fontconfig through the `fc-match` tool for a monospace match.
#[derive(Debug, Clone)]
pub struct FcMatchLocator {
    program: PathBuf,
    dpi: u32,
}

impl FcMatchLocator {
    #[must_use]
    pub fn new(dpi: u32) -> Self {
        Self {
            program: PathBuf::from("fc-match"),
            dpi,
        }
    }

    /// Use a different `fc-match` binary.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Fontconfig pattern for `family` at `points`.
    pub fn pattern(&self, family: &str, points: u32) -> String {
        format!("{family}:pixelsize={points}:dpi={}:spacing=mono", self.dpi)
    }
}

impl FontLocator for FcMatchLocator {
    fn locate(&self, family: &str, points: u32) -> Result<PathBuf, FontError> {
        let pattern = self.pattern(family, points);
        let output = Command::new(&self.program)
            .arg("--format=%{file}")
            .arg(&pattern)
            .output()
            .map_err(|source| FontError::Io {
                path: self.program.clone(),
                source,
            })?;
        let file = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || file.is_empty() {
            tracing::warn!(%pattern, status = ?output.status, "fc-match found no font");
            return Err(FontError::NotFound {
                family: family.to_string(),
            });
        }
        tracing::debug!(%pattern, %file, "fc-match resolved font");
        Ok(PathBuf::from(file))
    }
}

/// Always answers with one configured file.
#[derive(Debug, Clone)]
pub struct FixedLocator {
    path: PathBuf,
}

impl FixedLocator {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FontLocator for FixedLocator {
    fn locate(&self, _family: &str, _points: u32) -> Result<PathBuf, FontError> {
        Ok(self.path.clone())
    }
}

/// Try `primary`, then `fallback`, with `locator`.
pub fn locate_with_fallback(
    locator: &dyn FontLocator,
    primary: &str,
    fallback: &str,
    points: u32,
) -> Result<PathBuf, FontError> {
    match locator.locate(primary, points) {
        Ok(path) => Ok(path),
        Err(err) if primary != fallback => {
            tracing::info!(primary, fallback, error = %err, "trying fallback font family");
            locator.locate(fallback, points)
        }
        Err(err) => Err(err),
    }
}
