#![forbid(unsafe_code)]

//! Display command queue and producer cursor.
//!
//! The emulation engine positions a cursor (`set_x`, `set_y`, `set_font`) and
//! emits characters with `queue_char`; each character becomes one
//! [`DisplayCommand`] in a bounded [`CommandQueue`]. The renderer takes the
//! whole queue at the start of every frame with [`DisplayList::drain_into`].
//!
//! # Invariants
//!
//! 1. `len() <= capacity()` at all times; excess commands are dropped.
//! 2. Draining returns commands in insertion order and leaves the queue empty.
//! 3. After a drain the cursor is off until the producer sets both `x` and
//!    `y` again; characters queued while the cursor is off are discarded.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Queue full | Command dropped, `dropped()` incremented |
//! | Cursor off | Command and cursor advance both skipped |
//! | `ch == 0` | Cursor advances, nothing queued |

use crate::geometry::LOGICAL_MAX;

/// Default number of commands held between two frames.
pub const DEFAULT_COMMAND_CAPACITY: usize = 10_000;

/// Console character size. The discriminant is the cell width in logical
/// units; `Dot` plots single points and does not advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FontSize {
    Dot = 0,
    #[default]
    Small = 8,
    Medium = 16,
    Large = 32,
}

impl FontSize {
    /// Logical cursor advance per character.
    #[inline]
    pub const fn cell_width(self) -> u16 {
        self as u16
    }

    /// Parse the producer's font code (the cell width).
    pub const fn from_cell_width(width: u8) -> Option<Self> {
        match width {
            0 => Some(Self::Dot),
            8 => Some(Self::Small),
            16 => Some(Self::Medium),
            32 => Some(Self::Large),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// One queued draw instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayCommand {
    /// Logical column; used as a physical pixel column.
    pub x: u16,
    /// Logical row, already flipped so that 0 is the top.
    pub y: u16,
    pub font: FontSize,
    pub ch: u8,
}

/// Bounded, insertion-ordered command storage.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    commands: Vec<DisplayCommand>,
    capacity: usize,
}

impl CommandQueue {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.commands.len() >= self.capacity
    }

    /// Append a command. Returns `false` when the queue was full.
    pub fn push(&mut self, cmd: DisplayCommand) -> bool {
        if self.is_full() {
            return false;
        }
        self.commands.push(cmd);
        true
    }

    /// Move every command into `out` (cleared first) and empty the queue.
    ///
    /// The two vectors are swapped, so the caller's allocation is reused for
    /// the next batch and no copying happens while the lock is held.
    pub fn drain_into(&mut self, out: &mut Vec<DisplayCommand>) {
        out.clear();
        std::mem::swap(&mut self.commands, out);
        if self.commands.capacity() < self.capacity {
            self.commands
                .reserve_exact(self.capacity - self.commands.capacity());
        }
    }

    /// Discard every queued command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn as_slice(&self) -> &[DisplayCommand] {
        &self.commands
    }
}

/// Command queue plus the producer's cursor.
#[derive(Debug, Clone)]
pub struct DisplayList {
    queue: CommandQueue,
    font: FontSize,
    x: Option<u16>,
    y: Option<u16>,
    dropped: u64,
}

impl DisplayList {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: CommandQueue::with_capacity(capacity),
            font: FontSize::default(),
            x: None,
            y: None,
            dropped: 0,
        }
    }

    pub fn set_font(&mut self, font: FontSize) {
        self.font = font;
    }

    pub fn set_x(&mut self, x: u16) {
        self.x = Some(x);
    }

    /// Set the row in console coordinates (0 at the bottom).
    pub fn set_y(&mut self, y: u16) {
        self.y = Some(LOGICAL_MAX.saturating_sub(y));
    }

    /// Current font.
    pub fn font(&self) -> FontSize {
        self.font
    }

    /// Cursor position in screen orientation, `None` when the cursor is off.
    pub fn cursor(&self) -> Option<(u16, u16)> {
        Some((self.x?, self.y?))
    }

    /// Queue `ch` at the cursor and advance it by one cell.
    pub fn queue_char(&mut self, ch: u8) {
        if self.queue.is_full() {
            self.dropped += 1;
            return;
        }
        let Some((x, y)) = self.cursor() else {
            return;
        };
        if ch != 0 {
            self.queue.push(DisplayCommand {
                x,
                y,
                font: self.font,
                ch,
            });
        }
        self.x = Some(x.saturating_add(self.font.cell_width()));
    }

    /// Hand every queued command to the renderer and turn the cursor off.
    pub fn drain_into(&mut self, out: &mut Vec<DisplayCommand>) {
        self.queue.drain_into(out);
        self.x = None;
        self.y = None;
    }

    /// Convenience wrapper around [`DisplayList::drain_into`].
    #[must_use]
    pub fn drain(&mut self) -> Vec<DisplayCommand> {
        let mut out = Vec::new();
        self.drain_into(&mut out);
        out
    }

    /// Drop all pending commands without rendering them.
    pub fn discard(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Commands rejected because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_CAPACITY)
    }
}
