#![deny(unsafe_code)]

//! Software rendering for the phosphor console.
//!
//! # Role in the workspace
//! `phosphor-render` owns everything that touches pixels: the window-sized
//! [`image::LogicalImage`], phosphor decay, glyph rasterization with a
//! per-font cache, and the shared-memory [`frame_pool::FramePool`] that hands
//! finished frames to the display server.
//!
//! # Primary responsibilities
//! - **Drawing**: [`raster::draw_character`], [`raster::draw_point`] and
//!   [`raster::draw_string`] blit glyphs with per-pixel clipping.
//! - **Fonts**: [`font::ConsoleFont`] wraps a [`font::GlyphRasterizer`]
//!   backend (fontdue or the built-in 8x8 face) and caches codes below 256.
//! - **Buffers**: [`shm::ShmSegment`] owns a mapped shared-memory file and
//!   [`frame_pool::FramePool`] recycles them between frames.
//!
//! # How it fits
//! `phosphor-core` supplies geometry and commands; `phosphor-runtime` drives
//! these primitives once per frame.
//!
//! Only [`shm`] contains `unsafe` (the memory mapping itself).

pub mod builtin_face;
pub mod font;
#[cfg(feature = "fontdue")]
pub mod fontdue_face;
pub mod frame_pool;
pub mod gamma;
pub mod glyph;
pub mod image;
pub mod locator;
pub mod pixel;
pub mod raster;
pub mod shm;

pub use font::{ConsoleFont, FontError, GlyphRasterizer};
pub use frame_pool::{BufferBackend, FramePool, PoolError};
pub use image::{ImageError, LogicalImage};
pub use pixel::PixelArgb;
