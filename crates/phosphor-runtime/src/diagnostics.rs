#![forbid(unsafe_code)]

//! Runtime diagnostic level.
//!
//! The console carries a level from 0 (quiet) to 3 (every command). F1, F2
//! and F3 switch to level 1, 2 or 3, and pressing the key for the current
//! level switches back to 0. Events at or below the level are emitted as
//! `tracing` debug events under the `phosphor_runtime::diag` target, so the
//! subscriber filter still has the final say.
//!
//! | Level | Emits |
//! |-------|-------|
//! | 1 | per-frame summaries, key dispatch |
//! | 2 | font switches, overlay state |
//! | 3 | every drawn command |

use std::sync::LazyLock;
use std::time::Instant;

/// Highest diagnostic level.
pub const MAX_LEVEL: u8 = 3;

/// Tracing target for level-gated diagnostics.
pub const TARGET: &str = "phosphor_runtime::diag";

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Milliseconds since the first diagnostic was considered.
#[inline]
pub fn elapsed_ms() -> u64 {
    START_TIME.elapsed().as_millis() as u64
}

/// Current diagnostic level of one console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    level: u8,
}

impl Diagnostics {
    #[must_use]
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(MAX_LEVEL),
        }
    }

    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// True when events of `level` should be emitted.
    #[inline]
    pub fn enabled(&self, level: u8) -> bool {
        level != 0 && level <= self.level
    }

    /// Switch to `level`, or back to 0 when already there.
    pub fn toggle(&mut self, level: u8) -> u8 {
        let level = level.min(MAX_LEVEL);
        self.level = if self.level == level { 0 } else { level };
        tracing::info!(level = self.level, "diagnostic level changed");
        self.level
    }
}

/// Emit a debug event when `$diag` enables `$level`.
macro_rules! diag {
    ($diag:expr, $level:expr, $($arg:tt)+) => {
        if $diag.enabled($level) {
            tracing::debug!(
                target: $crate::diagnostics::TARGET,
                elapsed_ms = $crate::diagnostics::elapsed_ms(),
                $($arg)+
            );
        }
    };
}

pub(crate) use diag;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_clamped() {
        assert_eq!(Diagnostics::new(9).level(), MAX_LEVEL);
    }

    #[test]
    fn toggling_the_current_level_turns_it_off() {
        let mut d = Diagnostics::default();
        assert_eq!(d.toggle(2), 2);
        assert!(d.enabled(1));
        assert!(d.enabled(2));
        assert!(!d.enabled(3));
        assert_eq!(d.toggle(2), 0);
        assert!(!d.enabled(1));
        assert_eq!(d.toggle(1), 1);
        assert_eq!(d.toggle(3), 3);
    }

    #[test]
    fn level_zero_is_never_enabled() {
        let d = Diagnostics::new(3);
        assert!(!d.enabled(0));
    }

    #[test]
    fn gated_events_do_not_panic_without_subscriber() {
        let quiet = Diagnostics::default();
        let loud = Diagnostics::new(3);
        diag!(quiet, 1, frame = 1u32, "quiet");
        diag!(loud, 3, frame = 2u32, "loud");
    }
}
