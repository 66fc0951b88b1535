#![forbid(unsafe_code)]

//! The console's own thread.
//!
//! [`ConsoleWindow::spawn`] builds a [`Console`] on a dedicated thread and
//! runs it; the engine keeps only the [`DisplayLink`]. The render loop checks
//! the link's `active` flag once per event, so [`ConsoleWindow::terminate`]
//! takes effect after the event being waited on arrives.

use crate::console::{Console, ConsoleError, FrameStats};
use crate::display::DisplayServer;
use phosphor_core::link::DisplayLink;
use std::io;
use std::thread::{self, JoinHandle};

const THREAD_NAME: &str = "phosphor-console";

/// Handle to a running console thread.
#[derive(Debug)]
pub struct ConsoleWindow {
    link: DisplayLink,
    handle: JoinHandle<Result<FrameStats, ConsoleError>>,
}

impl ConsoleWindow {
    /// Start the console thread. `build` runs on that thread and receives a
    /// clone of `link`.
    pub fn spawn<S, F>(link: DisplayLink, build: F) -> io::Result<Self>
    where
        S: DisplayServer + 'static,
        F: FnOnce(DisplayLink) -> Result<Console<S>, ConsoleError> + Send + 'static,
    {
        link.set_active(true);
        let thread_link = link.clone();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let mut console = build(thread_link.clone()).inspect_err(|err| {
                    tracing::error!(error = %err, "console failed to initialise");
                })?;
                let result = console.run();
                thread_link.set_active(false);
                result.map(|()| console.stats())
            })?;
        Ok(Self { link, handle })
    }

    pub fn link(&self) -> &DisplayLink {
        &self.link
    }

    /// True once the console thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the console to stop and wait for it.
    pub fn terminate(self) -> Result<FrameStats, ConsoleError> {
        self.link.set_active(false);
        self.wait()
    }

    /// Wait for the console to stop on its own.
    pub fn wait(self) -> Result<FrameStats, ConsoleError> {
        self.handle
            .join()
            .map_err(|_| ConsoleError::ThreadPanicked)?
    }
}
