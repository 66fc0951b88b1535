#![forbid(unsafe_code)]

//! A display server without a screen.
//!
//! `HeadlessDisplay` behaves like a well-mannered compositor: it answers a
//! committed frame request with a frame-done event, releases the previously
//! shown buffer when a new one is committed, and keeps a copy of the last
//! presented frame for inspection. Extra events (size hints, configures,
//! keys, close requests) are injected directly or scheduled to arrive after
//! a given number of presented frames.
//!
//! Time comes either from a [`ManualClock`] (deterministic, advanced by the
//! console's own pacing sleeps plus a fixed refresh step) or from the wall
//! clock.
//!
//! # Example
//!
//! ```ignore
//! let clock = ManualClock::new(0);
//! let mut display = HeadlessDisplay::new(clock.clone()).with_frame_limit(10);
//! display.schedule(3, DisplayEvent::Close);
//! ```

use crate::display::{DisplayError, DisplayServer};
use crate::pacing::ManualClock;
use phosphor_core::event::{BufferId, DisplayEvent, KeyEvent};
use phosphor_core::geometry::Size;
use phosphor_render::frame_pool::{BufferBackend, PoolError};
use phosphor_render::shm::ShmSegment;
use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Default compositor refresh step in milliseconds.
pub const DEFAULT_REFRESH_MS: u32 = 16;

/// A request the console made of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCall {
    CreateBuffer { id: BufferId, size: Size, stride: u32 },
    DestroyBuffer(BufferId),
    Attach(BufferId),
    Damage(Size),
    RequestFrame,
    Commit,
    AckConfigure(u32),
    SetTitle(String),
}

/// The contents of a committed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedFrame {
    pub id: BufferId,
    pub size: Size,
    pixels: Vec<u32>,
}

impl PresentedFrame {
    /// ARGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.size.width as usize + x as usize)
            .copied()
    }

    /// Pixels with a non-zero green channel.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| (p >> 8) & 0xff != 0).count()
    }

    /// Write the frame as a binary PPM image.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.size.width, self.size.height)?;
        let mut row = Vec::with_capacity(self.size.width as usize * 3);
        for line in self.pixels.chunks(self.size.width.max(1) as usize) {
            row.clear();
            for &p in line {
                row.extend_from_slice(&[(p >> 16) as u8, (p >> 8) as u8, p as u8]);
            }
            out.write_all(&row)?;
        }
        out.flush()
    }
}

#[derive(Debug, Clone)]
enum Clock {
    Manual(ManualClock),
    Real(Instant),
}

/// Scripted, screenless compositor.
#[derive(Debug)]
pub struct HeadlessDisplay {
    clock: Clock,
    refresh_ms: u32,
    injected: VecDeque<DisplayEvent>,
    scheduled: Vec<(u64, DisplayEvent)>,
    frame_requested: bool,
    frame_armed: bool,
    frame_limit: Option<u64>,
    buffer_limit: Option<usize>,
    presented: u64,
    next_id: u32,
    next_serial: u32,
    buffers: BTreeMap<BufferId, Size>,
    created: usize,
    pending_attach: Option<(BufferId, Vec<u8>)>,
    on_screen: Option<BufferId>,
    last_frame: Option<PresentedFrame>,
    record_calls: bool,
    calls: Vec<ServerCall>,
    title: String,
}

impl HeadlessDisplay {
    /// A display whose timestamps come from `clock`.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self::with_clock(Clock::Manual(clock))
    }

    /// A display stamped with wall-clock milliseconds that waits one
    /// refresh step before every frame-done.
    #[must_use]
    pub fn real_time() -> Self {
        Self::with_clock(Clock::Real(Instant::now()))
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            refresh_ms: DEFAULT_REFRESH_MS,
            injected: VecDeque::new(),
            scheduled: Vec::new(),
            frame_requested: false,
            frame_armed: false,
            frame_limit: None,
            buffer_limit: None,
            presented: 0,
            next_id: 1,
            next_serial: 1,
            buffers: BTreeMap::new(),
            created: 0,
            pending_attach: None,
            on_screen: None,
            last_frame: None,
            record_calls: true,
            calls: Vec::new(),
            title: String::new(),
        }
    }

    #[must_use]
    pub fn with_refresh_ms(mut self, ms: u32) -> Self {
        self.refresh_ms = ms;
        self
    }

    /// End the session after `frames` presented frames.
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Refuse buffer creation after `count` buffers.
    #[must_use]
    pub fn with_buffer_limit(mut self, count: usize) -> Self {
        self.buffer_limit = Some(count);
        self
    }

    /// Stop recording [`ServerCall`]s.
    #[must_use]
    pub fn without_call_log(mut self) -> Self {
        self.record_calls = false;
        self
    }

    /// Deliver `event` before anything else.
    pub fn push_event(&mut self, event: DisplayEvent) {
        self.injected.push_back(event);
    }

    pub fn push_key(&mut self, key: KeyEvent) {
        self.push_event(DisplayEvent::Key(key));
    }

    /// Deliver `event` once `after_frames` frames have been presented.
    pub fn schedule(&mut self, after_frames: u64, event: DisplayEvent) {
        self.scheduled.push((after_frames, event));
    }

    /// Schedule a size hint followed by the matching surface configure.
    pub fn schedule_resize(&mut self, after_frames: u64, width: u32, height: u32) {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.schedule(after_frames, DisplayEvent::Configure { width, height });
        self.schedule(after_frames, DisplayEvent::SurfaceConfigure { serial });
    }

    /// Frames committed so far.
    #[inline]
    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&PresentedFrame> {
        self.last_frame.as_ref()
    }

    pub fn calls(&self) -> &[ServerCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Buffers created and not yet destroyed.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Current timestamp in milliseconds.
    pub fn now_ms(&self) -> u32 {
        match &self.clock {
            Clock::Manual(clock) => clock.now_ms(),
            Clock::Real(start) => start.elapsed().as_millis() as u32,
        }
    }

    fn record(&mut self, call: ServerCall) {
        if self.record_calls {
            self.calls.push(call);
        }
    }

    fn take_due(&mut self) -> Option<DisplayEvent> {
        let idx = self
            .scheduled
            .iter()
            .position(|(after, _)| *after <= self.presented)?;
        Some(self.scheduled.remove(idx).1)
    }

    fn limit_reached(&self) -> bool {
        self.frame_limit.is_some_and(|limit| self.presented >= limit)
    }

    fn frame_done(&mut self) -> DisplayEvent {
        self.frame_armed = false;
        match &self.clock {
            Clock::Manual(clock) => clock.advance(self.refresh_ms),
            Clock::Real(_) => std::thread::sleep(Duration::from_millis(u64::from(self.refresh_ms))),
        }
        DisplayEvent::FrameDone {
            time_ms: self.now_ms(),
        }
    }
}

impl BufferBackend for HeadlessDisplay {
    fn create_buffer(
        &mut self,
        segment: &ShmSegment,
        size: Size,
        stride: u32,
    ) -> Result<BufferId, PoolError> {
        if self.buffer_limit.is_some_and(|limit| self.created >= limit) {
            return Err(PoolError::Backend("buffer limit reached".to_string()));
        }
        let needed = u64::from(stride) * u64::from(size.height);
        if stride < size.width.saturating_mul(4) || (segment.len() as u64) < needed {
            return Err(PoolError::Backend(format!(
                "segment of {} bytes cannot hold {}x{} with stride {stride}",
                segment.len(),
                size.width,
                size.height
            )));
        }
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.buffers.insert(id, size);
        self.record(ServerCall::CreateBuffer { id, size, stride });
        Ok(id)
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
        if self.on_screen == Some(id) {
            self.on_screen = None;
        }
        self.record(ServerCall::DestroyBuffer(id));
    }
}

impl DisplayServer for HeadlessDisplay {
    fn attach(&mut self, id: BufferId, pixels: &[u8]) {
        self.pending_attach = Some((id, pixels.to_vec()));
        self.record(ServerCall::Attach(id));
    }

    fn damage_full(&mut self, size: Size) {
        self.record(ServerCall::Damage(size));
    }

    fn request_frame(&mut self) {
        self.frame_requested = true;
        self.record(ServerCall::RequestFrame);
    }

    fn commit(&mut self) {
        self.record(ServerCall::Commit);
        if let Some((id, bytes)) = self.pending_attach.take()
            && let Some(&size) = self.buffers.get(&id)
        {
            let pixels = bytes
                .chunks_exact(4)
                .take(size.area())
                .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            if let Some(previous) = self.on_screen.replace(id)
                && previous != id
            {
                self.injected.push_back(DisplayEvent::BufferRelease(previous));
            }
            self.last_frame = Some(PresentedFrame { id, size, pixels });
            self.presented += 1;
        }
        if self.frame_requested {
            self.frame_requested = false;
            self.frame_armed = true;
        }
    }

    fn ack_configure(&mut self, serial: u32) {
        self.record(ServerCall::AckConfigure(serial));
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.record(ServerCall::SetTitle(title.to_string()));
    }

    fn next_event(&mut self) -> Result<Option<DisplayEvent>, DisplayError> {
        if let Some(event) = self.injected.pop_front() {
            return Ok(Some(event));
        }
        if let Some(event) = self.take_due() {
            return Ok(Some(event));
        }
        if self.frame_armed && !self.limit_reached() {
            return Ok(Some(self.frame_done()));
        }
        Ok(None)
    }
}
