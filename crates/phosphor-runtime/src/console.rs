#![forbid(unsafe_code)]

//! The render context.
//!
//! [`Console`] owns every piece of render state (image, fonts, frame pool,
//! key ring, pacing) and advances it one [`DisplayEvent`] at a time. It is
//! driven by [`Console::run`], normally on the thread started by
//! [`crate::window::ConsoleWindow`].
//!
//! # Frame step
//!
//! On each frame-done event:
//!
//! 1. with a resize pending, record the timestamp and stop;
//! 2. sleep out the rest of the frame interval;
//! 3. deliver at most one queued key to the engine;
//! 4. decay the image;
//! 5. draw overlays, then the drained display list;
//! 6. copy the image into a free buffer, attach, damage, request the next
//!    frame and commit;
//! 7. record the timestamp.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | No free buffer / buffer creation fails during a frame | frame skipped, next frame still requested |
//! | Same during startup | [`ConsoleError::Pool`] |
//! | Image or pool reallocation fails on resize | logged, old size kept, next frame requested |
//! | Character missing from a font | character skipped |
//! | Release of a buffer the pool does not own | buffer destroyed |

use crate::clipboard::{Clipboard, NoClipboard, paste_into};
use crate::diagnostics::{Diagnostics, diag};
use crate::display::{DisplayError, DisplayServer};
use crate::fonts::FontSet;
use crate::keys::{KeyAction, KeyPacer, KeyTranslator};
use crate::overlay::{OverlayPass, Overlays};
use crate::pacing::{FramePacer, Sleeper, ThreadSleeper};
use crate::resize::{ResizeCoordinator, ResizeOutcome, ResizeState};
use phosphor_core::command_queue::DisplayCommand;
use phosphor_core::config::ConsoleConfig;
use phosphor_core::event::{BufferId, DisplayEvent, KeyEvent};
use phosphor_core::geometry::{PenPosition, YOffsetMap};
use phosphor_core::key_ring::{InvalidCapacity, KeyRingBuffer};
use phosphor_core::link::DisplayLink;
use phosphor_render::font::FontError;
use phosphor_render::frame_pool::{FramePool, PoolError, ReleaseOutcome};
use phosphor_render::gamma::GammaTable;
use phosphor_render::image::{ImageError, LogicalImage};
use phosphor_render::raster::{draw_character, draw_point};
use std::fmt;

/// Errors that stop the console.
#[derive(Debug)]
pub enum ConsoleError {
    Font(FontError),
    Image(ImageError),
    Pool(PoolError),
    Display(DisplayError),
    KeyRing(InvalidCapacity),
    /// The render thread panicked.
    ThreadPanicked,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Font(e) => write!(f, "font: {e}"),
            Self::Image(e) => write!(f, "image: {e}"),
            Self::Pool(e) => write!(f, "frame pool: {e}"),
            Self::Display(e) => write!(f, "{e}"),
            Self::KeyRing(e) => write!(f, "key buffer: {e}"),
            Self::ThreadPanicked => write!(f, "console thread panicked"),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Font(e) => Some(e),
            Self::Image(e) => Some(e),
            Self::Pool(e) => Some(e),
            Self::Display(e) => Some(e),
            Self::KeyRing(e) => Some(e),
            Self::ThreadPanicked => None,
        }
    }
}

impl From<FontError> for ConsoleError {
    fn from(e: FontError) -> Self {
        Self::Font(e)
    }
}

impl From<ImageError> for ConsoleError {
    fn from(e: ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<PoolError> for ConsoleError {
    fn from(e: PoolError) -> Self {
        Self::Pool(e)
    }
}

impl From<DisplayError> for ConsoleError {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

impl From<InvalidCapacity> for ConsoleError {
    fn from(e: InvalidCapacity) -> Self {
        Self::KeyRing(e)
    }
}

/// Counters kept by the render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frames presented, including the first one.
    pub frames: u64,
    /// Frames drawn but not presented.
    pub skipped: u64,
    /// Frame-done events that arrived with a resize pending.
    pub deferred: u64,
    pub resizes: u64,
    /// Display-list commands drawn.
    pub commands: u64,
    /// Keys handed to the engine.
    pub keys_sent: u64,
    /// Total pacing sleep in milliseconds.
    pub slept_ms: u64,
}

/// Console render state bound to one display server.
pub struct Console<S: DisplayServer> {
    config: ConsoleConfig,
    server: S,
    link: DisplayLink,
    ring: KeyRingBuffer,
    fonts: FontSet,
    gamma: GammaTable,
    image: LogicalImage,
    y_map: YOffsetMap,
    pool: FramePool,
    resize: ResizeCoordinator,
    pacer: FramePacer,
    sleeper: Box<dyn Sleeper>,
    translator: KeyTranslator,
    key_pacer: KeyPacer,
    clipboard: Box<dyn Clipboard>,
    overlays: Overlays,
    diagnostics: Diagnostics,
    commands: Vec<DisplayCommand>,
    frame_outstanding: bool,
    stats: FrameStats,
}

impl<S: DisplayServer> Console<S> {
    /// Build a console, loading fonts as `config` describes.
    pub fn new(config: ConsoleConfig, server: S, link: DisplayLink) -> Result<Self, ConsoleError> {
        let fonts = FontSet::load(&config)?;
        Self::with_fonts(config, server, link, fonts)
    }

    /// Build a console around already loaded fonts.
    pub fn with_fonts(
        config: ConsoleConfig,
        server: S,
        link: DisplayLink,
        fonts: FontSet,
    ) -> Result<Self, ConsoleError> {
        let ring = KeyRingBuffer::allocate(config.key_buffer)?;
        let image = LogicalImage::try_new(config.size)?;
        let pool = FramePool::new(config.pool_slots, config.size)?;
        Ok(Self {
            gamma: GammaTable::new(config.gamma),
            y_map: YOffsetMap::new(config.size.height),
            resize: ResizeCoordinator::new(),
            pacer: FramePacer::new(config.frame_interval_ms),
            sleeper: Box::new(ThreadSleeper),
            translator: KeyTranslator::new(),
            key_pacer: KeyPacer::new(config.return_settle_frames),
            clipboard: Box::new(NoClipboard),
            overlays: Overlays::new(config.close_notice_frames, config.show_trace_status),
            diagnostics: Diagnostics::new(config.debug_level),
            commands: Vec::with_capacity(config.command_capacity),
            frame_outstanding: false,
            stats: FrameStats::default(),
            config,
            server,
            link,
            ring,
            fonts,
            image,
            pool,
        })
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut S {
        &mut self.server
    }

    pub fn link(&self) -> &DisplayLink {
        &self.link
    }

    pub fn image(&self) -> &LogicalImage {
        &self.image
    }

    pub fn y_map(&self) -> &YOffsetMap {
        &self.y_map
    }

    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    pub fn ring(&self) -> &KeyRingBuffer {
        &self.ring
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn resize_state(&self) -> ResizeState {
        self.resize.state()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Title, stale keys and the first frame.
    ///
    /// Failing to present the first frame is fatal.
    pub fn start(&mut self) -> Result<(), ConsoleError> {
        self.ring.clear();
        self.server.set_title(&self.config.title);
        self.present()?;
        tracing::info!(
            width = self.image.width(),
            height = self.image.height(),
            title = %self.config.title,
            "console started"
        );
        Ok(())
    }

    /// Process events until the link is deactivated or the server ends the
    /// session, then tear down.
    pub fn run(&mut self) -> Result<(), ConsoleError> {
        let result = self.start().and_then(|()| self.dispatch());
        self.teardown();
        result
    }

    fn dispatch(&mut self) -> Result<(), ConsoleError> {
        while self.link.is_active()
            && let Some(event) = self.server.next_event()?
        {
            self.handle_event(event)?;
        }
        Ok(())
    }

    /// Apply one display-server event.
    pub fn handle_event(&mut self, event: DisplayEvent) -> Result<(), ConsoleError> {
        tracing::trace!(event = event.as_str(), "display event");
        match event {
            DisplayEvent::FrameDone { time_ms } => self.on_frame_done(time_ms),
            DisplayEvent::Configure { width, height } => {
                self.resize.on_size_hint(width, height, self.image.size());
                Ok(())
            }
            DisplayEvent::SurfaceConfigure { serial } => {
                self.on_surface_configure(serial);
                Ok(())
            }
            DisplayEvent::Close => {
                self.overlays.on_close_request();
                Ok(())
            }
            DisplayEvent::BufferRelease(id) => {
                self.on_buffer_release(id);
                Ok(())
            }
            DisplayEvent::Key(key) => {
                self.on_key(key);
                Ok(())
            }
            DisplayEvent::KeyboardLeave => {
                if !self.ring.is_empty() {
                    tracing::debug!(flushed = self.ring.len(), "keyboard focus lost");
                }
                self.ring.clear();
                Ok(())
            }
        }
    }

    fn on_frame_done(&mut self, time_ms: u32) -> Result<(), ConsoleError> {
        self.frame_outstanding = false;
        if self.resize.is_pending() {
            self.pacer.record(time_ms);
            self.stats.deferred += 1;
            diag!(self.diagnostics, 1, time_ms, "frame deferred by pending resize");
            return Ok(());
        }

        let _span = tracing::trace_span!("render_frame", frame = self.stats.frames).entered();
        self.stats.slept_ms += u64::from(self.pacer.pace(time_ms, self.sleeper.as_mut()));
        self.deliver_key();
        self.draw_frame();
        if let Err(err) = self.present() {
            self.stats.skipped += 1;
            tracing::warn!(error = %err, "frame not presented");
            self.request_next_frame();
        }
        self.pacer.record(time_ms);
        Ok(())
    }

    fn on_surface_configure(&mut self, serial: u32) {
        self.server.ack_configure(serial);
        let outcome = match self.resize.resize_buffers(
            &mut self.image,
            &mut self.pool,
            &mut self.y_map,
            &mut self.server,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    width = self.image.width(),
                    height = self.image.height(),
                    "resize failed, keeping current size"
                );
                ResizeOutcome::Unchanged
            }
        };
        match outcome {
            ResizeOutcome::Idle => return,
            ResizeOutcome::Unchanged => {}
            ResizeOutcome::Resized { .. } => self.stats.resizes += 1,
        }
        // Frame-done events were swallowed while the resize was pending.
        if !self.frame_outstanding {
            self.request_next_frame();
        }
    }

    fn on_buffer_release(&mut self, id: BufferId) {
        match self.pool.release(id) {
            ReleaseOutcome::Recycled { slot } => {
                diag!(self.diagnostics, 2, slot, id = id.0, "buffer released");
            }
            ReleaseOutcome::Orphaned => {
                tracing::debug!(id = id.0, "destroying buffer released after teardown");
                self.server.destroy_buffer(id);
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let mut mask = self.link.trace_mask();
        let out = self.translator.on_key(key, &mut self.ring, &mut mask);
        if out.mask_changed {
            self.link.set_trace_mask(mask);
        }
        if let Some(sym) = out.queued {
            diag!(self.diagnostics, 2, sym = sym.raw(), queued = self.ring.len(), "key queued");
        }
    }

    fn deliver_key(&mut self) {
        let busy = self.link.key_pending();
        let Some(action) = self.key_pacer.next_key(&mut self.ring, busy) else {
            return;
        };
        diag!(self.diagnostics, 1, action = ?action, "key dispatched");
        match action {
            KeyAction::Send(byte) => {
                self.link.post_key(byte);
                self.stats.keys_sent += 1;
            }
            KeyAction::SendReturn => {
                self.link.post_key(b'\r');
                self.stats.keys_sent += 1;
            }
            KeyAction::Ignore => {}
            KeyAction::ToggleDiagnostics(level) => {
                self.diagnostics.toggle(level);
            }
            KeyAction::Paste => match self.clipboard.read_text() {
                Some(text) => {
                    paste_into(&text, &mut self.ring);
                }
                None => tracing::debug!("clipboard empty"),
            },
        }
    }

    fn draw_frame(&mut self) {
        self.image.decay();
        let pass = self.overlays.draw(
            &mut self.image,
            &self.gamma,
            &mut self.fonts,
            &self.y_map,
            &self.link,
            self.stats.frames,
        );
        match pass {
            OverlayPass::SkipList => self.link.discard_pending(),
            OverlayPass::DrawList => {
                self.link.drain_into(&mut self.commands);
                self.draw_commands();
            }
        }
    }

    fn draw_commands(&mut self) {
        let mut current = None;
        for cmd in &self.commands {
            if current != Some(cmd.font) {
                current = Some(cmd.font);
                diag!(self.diagnostics, 2, font = cmd.font.as_str(), "font switch");
            }
            let pen = PenPosition::from_pixels(i32::from(cmd.x), i32::from(self.y_map.row(cmd.y)));
            diag!(self.diagnostics, 3, x = pen.pixel_x(), y = pen.pixel_y(), ch = cmd.ch, "draw");
            match self.fonts.get_mut(cmd.font) {
                None => {
                    draw_point(&mut self.image, pen);
                }
                Some(font) => {
                    if let Err(err) =
                        draw_character(&mut self.image, &self.gamma, font, u32::from(cmd.ch), pen)
                    {
                        tracing::debug!(ch = cmd.ch, error = %err, "character not drawn");
                    }
                }
            }
        }
        self.stats.commands += self.commands.len() as u64;
        diag!(self.diagnostics, 1, commands = self.commands.len(), "display list drawn");
    }

    fn present(&mut self) -> Result<(), PoolError> {
        let presented = self.pool.populate(&self.image, &mut self.server)?;
        let bytes = self.pool.bytes(presented.slot).unwrap_or(&[]);
        self.server.attach(presented.id, bytes);
        self.server.damage_full(self.image.size());
        self.request_next_frame();
        self.stats.frames += 1;
        Ok(())
    }

    fn request_next_frame(&mut self) {
        self.server.request_frame();
        self.server.commit();
        self.frame_outstanding = true;
    }

    /// Release the key ring and destroy every frame buffer.
    pub fn teardown(&mut self) {
        self.ring.release();
        self.pool.shutdown(&mut self.server);
        self.commands.clear();
        tracing::info!(
            frames = self.stats.frames,
            skipped = self.stats.skipped,
            resizes = self.stats.resizes,
            keys = self.stats.keys_sent,
            "console stopped"
        );
    }
}

impl<S: DisplayServer> fmt::Debug for Console<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("size", &self.image.size())
            .field("resize", &self.resize.state())
            .field("pool", &self.pool.counts())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::StaticClipboard;
    use crate::headless::{HeadlessDisplay, ServerCall};
    use crate::pacing::ManualClock;
    use phosphor_core::command_queue::FontSize;
    use phosphor_core::event::Modifiers;
    use phosphor_core::geometry::LOGICAL_MAX;
    use phosphor_core::trace_mask::TraceMask;
    use phosphor_core::keysym::KeySym;

    fn console(config: ConsoleConfig) -> (Console<HeadlessDisplay>, ManualClock) {
        let clock = ManualClock::new(0);
        let config = config.with_builtin_font(true);
        let link = DisplayLink::new(config.command_capacity);
        let display = HeadlessDisplay::new(clock.clone());
        let console = Console::new(config, display, link)
            .unwrap()
            .with_sleeper(Box::new(clock.clone()));
        (console, clock)
    }

    fn small() -> ConsoleConfig {
        ConsoleConfig::default().with_size(128, 96)
    }

    fn step(console: &mut Console<HeadlessDisplay>) -> Option<DisplayEvent> {
        let event = console.server_mut().next_event().unwrap()?;
        console.handle_event(event.clone()).unwrap();
        Some(event)
    }

    /// Run until the next frame-done has been handled.
    fn frame(console: &mut Console<HeadlessDisplay>) {
        while let Some(event) = step(console) {
            if matches!(event, DisplayEvent::FrameDone { .. }) {
                return;
            }
        }
        panic!("session ended before a frame");
    }

    #[test]
    fn start_sets_title_and_presents() {
        let (mut c, _) = console(small().with_title("Operator"));
        c.start().unwrap();
        assert_eq!(c.server().title(), "Operator");
        assert_eq!(c.server().presented(), 1);
        assert_eq!(c.stats().frames, 1);
        assert!(c.server().calls().contains(&ServerCall::RequestFrame));
    }

    #[test]
    fn start_discards_keys_typed_before_the_first_frame() {
        let (mut c, _) = console(small());
        c.handle_event(DisplayEvent::Key(KeyEvent::char('a'))).unwrap();
        assert_eq!(c.ring().len(), 1);
        c.start().unwrap();
        assert!(c.ring().is_empty());
    }

    #[test]
    fn queued_commands_reach_the_screen() {
        let (mut c, _) = console(small());
        c.start().unwrap();
        let link = c.link().clone();
        link.set_font(FontSize::Dot);
        link.set_x(3);
        link.set_y(LOGICAL_MAX);
        link.queue_char(1);
        link.set_font(FontSize::Small);
        link.set_x(16);
        link.set_y(LOGICAL_MAX);
        link.queue_char(b'H');
        frame(&mut c);

        let shown = c.server().last_frame().unwrap();
        assert_eq!(shown.pixel(3, 0), Some(0xFF00_FF00));
        let glyph_lit = (16..24)
            .flat_map(|x| (0..12).map(move |y| (x, y)))
            .filter(|&(x, y)| shown.pixel(x, y).is_some_and(|p| p & 0xff00 != 0))
            .count();
        assert!(glyph_lit > 0);
        assert_eq!(c.stats().commands, 2);
        assert_eq!(link.pending(), 0);
    }

    #[test]
    fn every_frame_decays_the_previous_image() {
        let (mut c, _) = console(small());
        c.start().unwrap();
        c.link().set_font(FontSize::Dot);
        c.link().set_x(10);
        c.link().set_y(LOGICAL_MAX);
        c.link().queue_char(1);
        frame(&mut c);
        assert_eq!(c.image().get(10, 0).unwrap().green(), 255);
        frame(&mut c);
        assert_eq!(c.image().get(10, 0).unwrap().green(), 63);
        frame(&mut c);
        assert_eq!(c.image().get(10, 0).unwrap().green(), 15);
    }

    #[test]
    fn pacing_alternates_without_drift_compensation() {
        let (mut c, clock) = console(small());
        c.start().unwrap();
        let mut slept = Vec::new();
        let mut last = 0;
        for _ in 0..4 {
            frame(&mut c);
            let total = c.stats().slept_ms;
            slept.push(total - last);
            last = total;
        }
        assert_eq!(slept, vec![0, 84, 0, 84]);
        assert_eq!(u64::from(clock.total_slept_ms()), c.stats().slept_ms);
    }

    #[test]
    fn keys_are_delivered_every_other_frame() {
        let (mut c, _) = console(small());
        c.start().unwrap();
        for ch in ['a', 'b'] {
            c.handle_event(DisplayEvent::Key(KeyEvent::char(ch))).unwrap();
        }
        let link = c.link().clone();
        let mut seen = Vec::new();
        for _ in 0..4 {
            frame(&mut c);
            seen.push(link.take_key());
        }
        assert_eq!(seen, vec![b'a', 0, b'b', 0]);
    }

    #[test]
    fn busy_engine_blocks_delivery() {
        let (mut c, _) = console(small());
        c.start().unwrap();
        c.link().post_key(b'z');
        c.handle_event(DisplayEvent::Key(KeyEvent::char('a'))).unwrap();
        frame(&mut c);
        assert_eq!(c.ring().len(), 1);
        assert_eq!(c.link().take_key(), b'z');
    }

    #[test]
    fn return_holds_keys_for_the_settle_delay() {
        let (mut c, _) = console(small());
        c.start().unwrap();
        c.handle_event(DisplayEvent::Key(KeyEvent::released(KeySym::RETURN)))
            .unwrap();
        c.handle_event(DisplayEvent::Key(KeyEvent::char('y'))).unwrap();
        let link = c.link().clone();

        frame(&mut c);
        assert_eq!(link.take_key(), b'\r');
        for _ in 0..31 {
            frame(&mut c);
            assert_eq!(link.take_key(), 0);
        }
        frame(&mut c);
        assert_eq!(link.take_key(), b'y');
    }

    #[test]
    fn function_keys_toggle_diagnostics() {
        let (mut c, _) = console(small());
        c.start().unwrap();
        c.handle_event(DisplayEvent::Key(KeyEvent::released(KeySym::F2)))
            .unwrap();
        frame(&mut c);
        assert_eq!(c.diagnostics().level(), 2);
        assert_eq!(c.link().take_key(), 0);
    }

    #[test]
    fn paste_feeds_the_clipboard_into_the_ring() {
        let (c, _) = console(small());
        let mut c = c.with_clipboard(Box::new(StaticClipboard::new("ok")));
        c.start().unwrap();
        c.handle_event(DisplayEvent::Key(
            KeyEvent::char('p').with_modifiers(Modifiers::ALT),
        ))
        .unwrap();
        frame(&mut c);
        assert_eq!(c.ring().len(), 2);
        let link = c.link().clone();
        frame(&mut c);
        frame(&mut c);
        assert_eq!(link.take_key(), b'o');
    }

    #[test]
    fn keyboard_leave_flushes_the_ring() {
        let (mut c, _) = console(small());
        c.handle_event(DisplayEvent::Key(KeyEvent::char('q'))).unwrap();
        c.handle_event(DisplayEvent::KeyboardLeave).unwrap();
        assert!(c.ring().is_empty());
    }

    #[test]
    fn trace_chords_update_the_link() {
        let (mut c, _) = console(small());
        c.handle_event(DisplayEvent::Key(
            KeyEvent::char('5').with_modifiers(Modifiers::ALT),
        ))
        .unwrap();
        assert_eq!(c.link().trace_mask(), TraceMask::PP5);
    }

    #[test]
    fn close_request_shows_notice_and_drops_commands() {
        let (mut c, _) = console(small().with_size(640, 480));
        c.start().unwrap();
        c.handle_event(DisplayEvent::Close).unwrap();
        c.link().set_font(FontSize::Dot);
        c.link().set_x(1);
        c.link().set_y(LOGICAL_MAX);
        c.link().queue_char(1);
        frame(&mut c);
        assert_eq!(c.link().pending(), 0);
        assert_eq!(c.stats().commands, 0);
        assert!(c.image().lit_pixels() > 0);
    }

    #[test]
    fn released_buffers_are_reused() {
        let (mut c, _) = console(small());
        c.start().unwrap();
        for _ in 0..6 {
            frame(&mut c);
        }
        let created = c
            .server()
            .calls()
            .iter()
            .filter(|call| matches!(call, ServerCall::CreateBuffer { .. }))
            .count();
        assert_eq!(created, 2);
        assert!(matches!(step(&mut c), Some(DisplayEvent::BufferRelease(_))));
        assert_eq!(c.pool().counts().attached, 1);
    }

    #[test]
    fn exhausted_pool_skips_frames_but_keeps_the_loop_alive() {
        let clock = ManualClock::new(0);
        let config = small().with_builtin_font(true).with_pool_slots(1);
        let link = DisplayLink::new(64);
        let display = HeadlessDisplay::new(clock.clone()).with_buffer_limit(1);
        let mut c = Console::new(config, display, link)
            .unwrap()
            .with_sleeper(Box::new(clock));
        c.start().unwrap();
        frame(&mut c);
        assert_eq!(c.stats().skipped, 1);
        frame(&mut c);
        assert_eq!(c.stats().skipped, 2);
        assert_eq!(c.stats().frames, 1);
    }

    #[test]
    fn first_frame_failure_is_fatal() {
        let clock = ManualClock::new(0);
        let config = small().with_builtin_font(true);
        let display = HeadlessDisplay::new(clock).with_buffer_limit(0);
        let mut c = Console::new(config, display, DisplayLink::new(8)).unwrap();
        assert!(matches!(c.start(), Err(ConsoleError::Pool(_))));
    }

    #[test]
    fn orphaned_release_destroys_the_buffer() {
        let (mut c, _) = console(small());
        c.handle_event(DisplayEvent::BufferRelease(BufferId(99)))
            .unwrap();
        assert!(c
            .server()
            .calls()
            .contains(&ServerCall::DestroyBuffer(BufferId(99))));
    }

    #[test]
    fn zero_capacity_key_buffer_is_rejected() {
        let config = small().with_builtin_font(true).with_key_buffer(0);
        let display = HeadlessDisplay::new(ManualClock::default());
        assert!(matches!(
            Console::new(config, display, DisplayLink::new(8)),
            Err(ConsoleError::KeyRing(_))
        ));
    }

    #[test]
    fn run_stops_when_the_link_goes_inactive() {
        let clock = ManualClock::new(0);
        let config = small().with_builtin_font(true);
        let link = DisplayLink::new(64);
        let display = HeadlessDisplay::new(clock.clone()).with_frame_limit(1_000);
        let mut c = Console::new(config, display, link.clone())
            .unwrap()
            .with_sleeper(Box::new(clock));
        link.set_active(false);
        c.run().unwrap();
        assert_eq!(c.server().live_buffers(), 0);
        assert_eq!(c.ring().capacity(), 0);
    }

    #[test]
    fn run_ends_with_the_session() {
        let clock = ManualClock::new(0);
        let config = small().with_builtin_font(true);
        let display = HeadlessDisplay::new(clock.clone()).with_frame_limit(5);
        let mut c = Console::new(config, display, DisplayLink::new(64))
            .unwrap()
            .with_sleeper(Box::new(clock));
        c.run().unwrap();
        assert_eq!(c.stats().frames, 5);
        assert_eq!(c.server().live_buffers(), 0);
    }

    #[test]
    fn failed_resize_keeps_presenting_at_the_old_size() {
        let (mut c, _clock) = console(small());
        c.start().unwrap();
        frame(&mut c);
        let before = c.stats().frames;

        c.handle_event(DisplayEvent::Configure {
            width: u32::MAX,
            height: u32::MAX,
        })
        .unwrap();
        c.handle_event(DisplayEvent::SurfaceConfigure { serial: 1 })
            .unwrap();
        assert_eq!(c.resize_state(), ResizeState::Idle);
        assert_eq!(c.image().size(), small().size);

        frame(&mut c);
        frame(&mut c);
        assert_eq!(c.stats().deferred, 0);
        assert_eq!(c.stats().resizes, 0);
        assert!(c.stats().frames >= before + 2);
        assert_eq!(c.server().last_frame().unwrap().size, small().size);
    }
}
