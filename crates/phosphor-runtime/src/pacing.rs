#![forbid(unsafe_code)]

//! Frame pacing.
//!
//! The display server reports each completed frame with a millisecond
//! timestamp. [`FramePacer`] compares it with the timestamp recorded after the
//! previous frame and sleeps for whatever is left of the target interval.
//! Timestamps wrap at `u32::MAX`; the difference is taken with wrapping
//! arithmetic so a wrap looks like a short interval, not a huge one.
//!
//! No drift compensation is applied: a frame that overruns the interval is
//! simply followed by a frame without a wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Something that can block the render thread.
pub trait Sleeper: Send {
    fn sleep_ms(&mut self, ms: u32);
}

/// Real sleeping on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// A millisecond clock advanced by hand.
///
/// Sleeping on a `ManualClock` advances it, which lets a headless display
/// produce frame timestamps that reflect the console's own waits.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
    slept: Arc<AtomicU32>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(start_ms)),
            slept: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }

    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }

    /// Total milliseconds spent in [`Sleeper::sleep_ms`].
    pub fn total_slept_ms(&self) -> u32 {
        self.slept.load(Ordering::Acquire)
    }
}

impl Sleeper for ManualClock {
    fn sleep_ms(&mut self, ms: u32) {
        self.slept.fetch_add(ms, Ordering::AcqRel);
        self.advance(ms);
    }
}

/// Two-timestamp frame pacer.
#[derive(Debug, Clone)]
pub struct FramePacer {
    target_ms: u32,
    last_frame: Option<u32>,
}

impl FramePacer {
    #[must_use]
    pub fn new(target_ms: u32) -> Self {
        Self {
            target_ms,
            last_frame: None,
        }
    }

    #[inline]
    pub fn target_ms(&self) -> u32 {
        self.target_ms
    }

    #[inline]
    pub fn last_frame(&self) -> Option<u32> {
        self.last_frame
    }

    /// Remember `time_ms` as the end of the latest frame.
    pub fn record(&mut self, time_ms: u32) {
        self.last_frame = Some(time_ms);
    }

    /// Milliseconds to wait before drawing a frame reported at `time_ms`.
    ///
    /// `None` before the first recorded frame or when the interval has
    /// already elapsed.
    pub fn wait_for(&self, time_ms: u32) -> Option<u32> {
        let last = self.last_frame?;
        let elapsed = time_ms.wrapping_sub(last);
        match self.target_ms.checked_sub(elapsed) {
            Some(0) | None => None,
            Some(wait) => Some(wait),
        }
    }

    /// Sleep out the remainder of the interval. Returns the time slept.
    pub fn pace(&self, time_ms: u32, sleeper: &mut dyn Sleeper) -> u32 {
        match self.wait_for(time_ms) {
            Some(wait) => {
                tracing::trace!(time_ms, wait, "pacing frame");
                sleeper.sleep_ms(wait);
                wait
            }
            None => 0,
        }
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(100)
    }
}
