#![forbid(unsafe_code)]

//! Clipboard paste.
//!
//! A paste request reads plain text from a [`Clipboard`] and feeds it into
//! the key ring one byte at a time, exactly as if it had been typed. Bytes
//! without a key symbol (and every non-ASCII byte) are dropped.

use phosphor_core::key_ring::KeyRingBuffer;
use phosphor_core::keysym::KeySym;
use std::process::Command;

/// Source of pasted text.
pub trait Clipboard: Send {
    /// Current plain-text contents, or `None` when empty or unreadable.
    fn read_text(&mut self) -> Option<Vec<u8>>;
}

/// A clipboard that is always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn read_text(&mut self) -> Option<Vec<u8>> {
        None
    }
}

/// Fixed clipboard contents.
#[derive(Debug, Clone, Default)]
pub struct StaticClipboard {
    text: Vec<u8>,
}

impl StaticClipboard {
    pub fn new(text: impl Into<Vec<u8>>) -> Self {
        Self { text: text.into() }
    }
}

impl Clipboard for StaticClipboard {
    fn read_text(&mut self) -> Option<Vec<u8>> {
        if self.text.is_empty() {
            None
        } else {
            Some(self.text.clone())
        }
    }
}

/// Reads the clipboard by running a helper such as `wl-paste`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// `wl-paste --no-newline --type text/plain`.
    pub fn wl_paste() -> Self {
        Self::new("wl-paste", &["--no-newline", "--type", "text/plain"])
    }
}

impl Clipboard for CommandClipboard {
    fn read_text(&mut self) -> Option<Vec<u8>> {
        let output = match Command::new(&self.program).args(&self.args).output() {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(program = %self.program, error = %err, "clipboard helper failed to start");
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!(program = %self.program, status = ?output.status, "clipboard empty");
            return None;
        }
        Some(output.stdout)
    }
}

/// Enqueue `text` into `ring`. Returns the number of keys queued.
pub fn paste_into(text: &[u8], ring: &mut KeyRingBuffer) -> usize {
    let mut queued = 0;
    for &byte in text {
        if !byte.is_ascii() {
            continue;
        }
        let sym = KeySym::from_char_code(u32::from(byte));
        if sym.is_none() {
            continue;
        }
        ring.enqueue(sym);
        queued += 1;
    }
    tracing::debug!(bytes = text.len(), queued, "clipboard pasted");
    queued
}
