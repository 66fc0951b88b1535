#![forbid(unsafe_code)]

//! The display-server seam.
//!
//! A [`DisplayServer`] is the compositor session: it wraps shared-memory
//! segments into buffers (through [`BufferBackend`]), presents them and
//! delivers [`DisplayEvent`]s. The render context only talks to the server
//! through this trait, so a headless implementation can stand in for a real
//! compositor in tests and demos.

use phosphor_core::event::{BufferId, DisplayEvent};
use phosphor_core::geometry::Size;
use phosphor_render::frame_pool::BufferBackend;
use std::fmt;

/// Errors reported by a display server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The connection to the compositor was lost.
    Disconnected,
    Protocol(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "display server disconnected"),
            Self::Protocol(msg) => write!(f, "display protocol error: {msg}"),
        }
    }
}

impl std::error::Error for DisplayError {}

/// A compositor session able to show console frames.
pub trait DisplayServer: BufferBackend + Send {
    /// Attach buffer `id` to the surface. `pixels` are its current contents.
    fn attach(&mut self, id: BufferId, pixels: &[u8]);

    /// Mark the whole surface of `size` as changed.
    fn damage_full(&mut self, size: Size);

    /// Ask for a frame-done event after the next commit.
    fn request_frame(&mut self);

    /// Apply attached state.
    fn commit(&mut self);

    /// Acknowledge a surface configure.
    fn ack_configure(&mut self, serial: u32);

    fn set_title(&mut self, title: &str);

    /// Block for the next event. `Ok(None)` means the session has ended.
    fn next_event(&mut self) -> Result<Option<DisplayEvent>, DisplayError>;
}
