#![forbid(unsafe_code)]

//! Runtime for the phosphor console.
//!
//! # Role in the workspace
//! `phosphor-runtime` turns display-server events into frames. It owns the
//! render context ([`console::Console`]), paces frames, coordinates resizes,
//! translates keys and hands finished images to a [`display::DisplayServer`].
//!
//! # Primary responsibilities
//! - **Frame loop**: [`console::Console::handle_event`] applies one event;
//!   [`console::Console::run`] loops until the session ends.
//! - **Pacing**: [`pacing::FramePacer`] keeps frames about one interval apart.
//! - **Resize**: [`resize::ResizeCoordinator`] defers reallocation until the
//!   compositor's configure is acknowledged.
//! - **Input**: [`keys`] handles trace chords and frame-paced delivery;
//!   [`clipboard`] feeds pastes into the key ring.
//! - **Threading**: [`window::ConsoleWindow`] runs the console on its own
//!   thread.
//! - **Headless**: [`headless::HeadlessDisplay`] stands in for a compositor.

pub mod clipboard;
pub mod console;
pub mod diagnostics;
pub mod display;
pub mod fonts;
pub mod headless;
pub mod keys;
pub mod overlay;
pub mod pacing;
pub mod resize;
pub mod window;

pub use console::{Console, ConsoleError, FrameStats};
pub use display::{DisplayError, DisplayServer};
pub use headless::HeadlessDisplay;
pub use window::ConsoleWindow;
