#![forbid(unsafe_code)]

//! Console configuration.
//!
//! Defaults reproduce the classic console: a 1100x750 window refreshed ten
//! times a second with 10/20/40 point monospace faces. Every field can be
//! overridden from the environment with [`ConsoleConfig::from_env`]:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PHOSPHOR_WIDTH` / `PHOSPHOR_HEIGHT` | initial window size |
//! | `PHOSPHOR_FRAME_MS` | frame interval |
//! | `PHOSPHOR_FONT_FAMILY` | family passed to the font locator |
//! | `PHOSPHOR_FONT_PATH` | explicit font file, skips the locator |
//! | `PHOSPHOR_FONT_SMALL` / `_MEDIUM` / `_LARGE` | point sizes (1..=288) |
//! | `PHOSPHOR_BUILTIN_FONT` | use the built-in 8x8 face |
//! | `PHOSPHOR_KEY_BUFFER` | key ring capacity |
//! | `PHOSPHOR_TITLE` | window title |
//! | `PHOSPHOR_DEBUG_LEVEL` | initial diagnostic level (0..=3) |
//! | `PHOSPHOR_TRACE_STATUS` | draw the trace-mask status line |

use crate::command_queue::DEFAULT_COMMAND_CAPACITY;
use crate::geometry::Size;
use crate::key_ring::MAX_KEY_RING_CAPACITY;
use std::path::PathBuf;

/// Largest accepted point size (four inches).
pub const MAX_FONT_POINTS: u32 = 288;

/// Point sizes of the three console faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontPoints {
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl Default for FontPoints {
    fn default() -> Self {
        Self {
            small: 10,
            medium: 20,
            large: 40,
        }
    }
}

/// Everything needed to bring up a console window.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Initial window size in pixels.
    pub size: Size,
    /// Target interval between frames in milliseconds.
    pub frame_interval_ms: u32,
    /// Display list capacity.
    pub command_capacity: usize,
    /// Number of frame-buffer pool slots.
    pub pool_slots: usize,
    /// Key ring capacity (usable slots are one fewer).
    pub key_buffer: usize,
    pub gamma: f32,
    /// Resolution used to convert point sizes to pixels.
    pub dpi: u32,
    pub font_family: String,
    /// Family tried when `font_family` cannot be resolved.
    pub fallback_family: String,
    /// Font file used for all three sizes, bypassing the locator.
    pub font_path: Option<PathBuf>,
    pub font_points: FontPoints,
    /// Use the built-in bitmap face instead of a font file.
    pub builtin_font: bool,
    pub title: String,
    /// Frames without key delivery after a carriage return.
    pub return_settle_frames: u8,
    /// Frames the close-request notice stays up.
    pub close_notice_frames: u32,
    /// Initial diagnostic level.
    pub debug_level: u8,
    /// Draw the trace-mask status line at the top of the screen.
    pub show_trace_status: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            size: Size::new(1100, 750),
            frame_interval_ms: 100,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            pool_slots: 10,
            key_buffer: MAX_KEY_RING_CAPACITY,
            gamma: 2.2,
            dpi: 75,
            font_family: "Lucida Typewriter".to_string(),
            fallback_family: "monospace".to_string(),
            font_path: None,
            font_points: FontPoints::default(),
            builtin_font: false,
            title: "Phosphor console".to_string(),
            return_settle_frames: 30,
            close_notice_frames: 50,
            debug_level: 0,
            show_trace_status: false,
        }
    }
}

impl ConsoleConfig {
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Size::new(width, height);
        self
    }

    #[must_use]
    pub fn with_frame_interval_ms(mut self, ms: u32) -> Self {
        self.frame_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_pool_slots(mut self, slots: usize) -> Self {
        self.pool_slots = slots;
        self
    }

    #[must_use]
    pub fn with_key_buffer(mut self, capacity: usize) -> Self {
        self.key_buffer = capacity;
        self
    }

    #[must_use]
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    #[must_use]
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_font_points(mut self, points: FontPoints) -> Self {
        self.font_points = points;
        self
    }

    #[must_use]
    pub fn with_builtin_font(mut self, builtin: bool) -> Self {
        self.builtin_font = builtin;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level.min(3);
        self
    }

    #[must_use]
    pub fn with_trace_status(mut self, show: bool) -> Self {
        self.show_trace_status = show;
        self
    }

    /// Defaults overridden by `PHOSPHOR_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Unparsable or empty values leave the field unchanged.
    #[must_use]
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |name: &str| {
            lookup(name).and_then(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };
        let number = |name: &str| string(name).and_then(|v| v.parse::<u64>().ok());
        let flag = |name: &str| {
            string(name).map(|v| {
                matches!(
                    v.as_str(),
                    "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "on" | "ON"
                )
            })
        };

        if let Some(w) = number("PHOSPHOR_WIDTH").and_then(|v| u32::try_from(v).ok())
            && w > 0
        {
            self.size.width = w;
        }
        if let Some(h) = number("PHOSPHOR_HEIGHT").and_then(|v| u32::try_from(v).ok())
            && h > 0
        {
            self.size.height = h;
        }
        if let Some(ms) = number("PHOSPHOR_FRAME_MS").and_then(|v| u32::try_from(v).ok()) {
            self.frame_interval_ms = ms;
        }
        if let Some(family) = string("PHOSPHOR_FONT_FAMILY") {
            self.font_family = family;
        }
        if let Some(path) = string("PHOSPHOR_FONT_PATH") {
            self.font_path = Some(PathBuf::from(path));
        }
        for (name, slot) in [
            ("PHOSPHOR_FONT_SMALL", &mut self.font_points.small),
            ("PHOSPHOR_FONT_MEDIUM", &mut self.font_points.medium),
            ("PHOSPHOR_FONT_LARGE", &mut self.font_points.large),
        ] {
            if let Some(pt) = number(name).and_then(|v| u32::try_from(v).ok())
                && (1..=MAX_FONT_POINTS).contains(&pt)
            {
                *slot = pt;
            }
        }
        if let Some(builtin) = flag("PHOSPHOR_BUILTIN_FONT") {
            self.builtin_font = builtin;
        }
        if let Some(cap) = number("PHOSPHOR_KEY_BUFFER").and_then(|v| usize::try_from(v).ok())
            && (1..=MAX_KEY_RING_CAPACITY).contains(&cap)
        {
            self.key_buffer = cap;
        }
        if let Some(title) = string("PHOSPHOR_TITLE") {
            self.title = title;
        }
        if let Some(level) = number("PHOSPHOR_DEBUG_LEVEL") {
            self.debug_level = level.min(3) as u8;
        }
        if let Some(show) = flag("PHOSPHOR_TRACE_STATUS") {
            self.show_trace_status = show;
        }
        self
    }
}
