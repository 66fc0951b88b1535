#![forbid(unsafe_code)]

//! Core: logical geometry, key symbols, the display list shared with the
//! emulation engine, display-server events and configuration.

pub mod command_queue;
pub mod config;
pub mod event;
pub mod geometry;
pub mod key_ring;
pub mod keysym;
pub mod link;
pub mod logging;
pub mod trace_mask;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
