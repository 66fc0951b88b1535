#![forbid(unsafe_code)]

//! Resize coordination.
//!
//! The compositor first suggests a size (a configure hint) and later asks for
//! the surface to be acknowledged. Buffers are only reallocated on the
//! acknowledgement; between the two the request is pending and frame-done
//! events skip drawing.
//!
//! # State Machine
//!
//! ```text
//! Idle ──hint(w,h) != current──▶ Pending{w,h}
//! Pending ──hint(w,h)──▶ Pending{w,h}        (latest wins)
//! Pending ──resize_buffers──▶ Idle
//! Pending ──resize_buffers fails──▶ Idle    (old size kept)
//! ```
//!
//! # Invariants
//!
//! 1. A zero width or height hint never changes state.
//! 2. After `resize_buffers` the image, pool and Y map all have the pending
//!    size and no `Ready` buffer of the old size remains.
//! 3. Pixels inside the overlap of the old and new sizes survive a resize;
//!    the rest of the new image is black.

use phosphor_core::geometry::{Size, YOffsetMap};
use phosphor_render::frame_pool::{BufferBackend, FramePool, PoolError};
use phosphor_render::image::{ImageError, LogicalImage};
use std::fmt;

/// Errors from [`ResizeCoordinator::resize_buffers`].
#[derive(Debug)]
pub enum ResizeError {
    Image(ImageError),
    Pool(PoolError),
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(e) => write!(f, "resizing image: {e}"),
            Self::Pool(e) => write!(f, "resizing frame pool: {e}"),
        }
    }
}

impl std::error::Error for ResizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(e) => Some(e),
            Self::Pool(e) => Some(e),
        }
    }
}

impl From<ImageError> for ResizeError {
    fn from(e: ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<PoolError> for ResizeError {
    fn from(e: PoolError) -> Self {
        Self::Pool(e)
    }
}

/// Resize request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeState {
    #[default]
    Idle,
    Pending(Size),
}

/// What [`ResizeCoordinator::resize_buffers`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Nothing was pending.
    Idle,
    /// The request matched the current size and was dropped.
    Unchanged,
    Resized { from: Size, to: Size, destroyed: usize },
}

#[derive(Debug, Clone, Default)]
pub struct ResizeCoordinator {
    state: ResizeState,
}

impl ResizeCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> ResizeState {
        self.state
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ResizeState::Pending(_))
    }

    /// Record a size suggestion. Returns `true` when a resize is now pending.
    pub fn on_size_hint(&mut self, width: u32, height: u32, current: Size) -> bool {
        if width == 0 || height == 0 {
            return self.is_pending();
        }
        let hint = Size::new(width, height);
        if hint != current {
            tracing::debug!(width, height, "resize pending");
            self.state = ResizeState::Pending(hint);
        }
        self.is_pending()
    }

    /// Apply the pending size to the image, pool and Y map.
    ///
    /// On error the request is dropped and the current size is kept.
    pub fn resize_buffers(
        &mut self,
        image: &mut LogicalImage,
        pool: &mut FramePool,
        y_map: &mut YOffsetMap,
        backend: &mut dyn BufferBackend,
    ) -> Result<ResizeOutcome, ResizeError> {
        let ResizeState::Pending(to) = self.state else {
            return Ok(ResizeOutcome::Idle);
        };
        let from = image.size();
        if to == from {
            self.state = ResizeState::Idle;
            return Ok(ResizeOutcome::Unchanged);
        }

        let _span = tracing::debug_span!("resize_buffers", width = to.width, height = to.height)
            .entered();
        let applied = image.resized(to).map_err(ResizeError::from).and_then(|resized| {
            pool.set_size(to)?;
            Ok(resized)
        });
        let resized = match applied {
            Ok(resized) => resized,
            Err(err) => {
                self.state = ResizeState::Idle;
                return Err(err);
            }
        };
        let destroyed = pool.teardown_available(backend);
        *image = resized;
        *y_map = YOffsetMap::new(to.height);
        self.state = ResizeState::Idle;
        tracing::info!(
            from_w = from.width,
            from_h = from.height,
            to_w = to.width,
            to_h = to.height,
            destroyed,
            "frame buffers resized"
        );
        Ok(ResizeOutcome::Resized {
            from,
            to,
            destroyed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phosphor_core::event::BufferId;
    use phosphor_render::frame_pool::SlotState;
    use phosphor_render::pixel::PixelArgb;
    use phosphor_render::shm::ShmSegment;

    #[derive(Default)]
    struct Backend {
        next: u32,
        destroyed: Vec<BufferId>,
    }

    impl BufferBackend for Backend {
        fn create_buffer(
            &mut self,
            _segment: &ShmSegment,
            _size: Size,
            _stride: u32,
        ) -> Result<BufferId, PoolError> {
            self.next += 1;
            Ok(BufferId(self.next))
        }

        fn destroy_buffer(&mut self, id: BufferId) {
            self.destroyed.push(id);
        }
    }

    fn parts(size: Size) -> (LogicalImage, FramePool, YOffsetMap) {
        (
            LogicalImage::try_new(size).unwrap(),
            FramePool::new(4, size).unwrap(),
            YOffsetMap::new(size.height),
        )
    }

    #[test]
    fn zero_hints_are_ignored() {
        let mut rc = ResizeCoordinator::new();
        assert!(!rc.on_size_hint(0, 600, Size::new(100, 100)));
        assert!(!rc.on_size_hint(800, 0, Size::new(100, 100)));
        assert_eq!(rc.state(), ResizeState::Idle);
    }

    #[test]
    fn same_size_hint_stays_idle() {
        let mut rc = ResizeCoordinator::new();
        assert!(!rc.on_size_hint(100, 100, Size::new(100, 100)));
    }

    #[test]
    fn latest_hint_wins() {
        let mut rc = ResizeCoordinator::new();
        rc.on_size_hint(200, 100, Size::new(100, 100));
        rc.on_size_hint(300, 150, Size::new(100, 100));
        assert_eq!(rc.state(), ResizeState::Pending(Size::new(300, 150)));
    }

    #[test]
    fn resize_swaps_image_pool_and_map() {
        let size = Size::new(40, 30);
        let (mut image, mut pool, mut map) = parts(size);
        let mut backend = Backend::default();
        image.put(5, 5, PixelArgb::GREEN);
        image.put(39, 29, PixelArgb::GREEN);

        let presented = pool.populate(&image, &mut backend).unwrap();
        pool.release(presented.id);
        assert_eq!(pool.counts().ready, 1);

        let mut rc = ResizeCoordinator::new();
        rc.on_size_hint(20, 60, size);
        let outcome = rc
            .resize_buffers(&mut image, &mut pool, &mut map, &mut backend)
            .unwrap();

        assert_eq!(
            outcome,
            ResizeOutcome::Resized {
                from: size,
                to: Size::new(20, 60),
                destroyed: 1
            }
        );
        assert!(!rc.is_pending());
        assert_eq!(image.size(), Size::new(20, 60));
        assert_eq!(pool.size(), Size::new(20, 60));
        assert_eq!(map.height(), 60);
        assert_eq!(backend.destroyed, vec![presented.id]);
        assert_eq!(image.get(5, 5), Some(PixelArgb::GREEN));
        assert_eq!(image.get(10, 45), Some(PixelArgb::BLACK));
        assert!(matches!(pool.slot(presented.slot), Some(SlotState::Empty)));
    }

    #[test]
    fn attached_buffers_survive_a_resize() {
        let size = Size::new(16, 16);
        let (mut image, mut pool, mut map) = parts(size);
        let mut backend = Backend::default();
        let attached = pool.populate(&image, &mut backend).unwrap();

        let mut rc = ResizeCoordinator::new();
        rc.on_size_hint(32, 32, size);
        rc.resize_buffers(&mut image, &mut pool, &mut map, &mut backend)
            .unwrap();

        assert!(backend.destroyed.is_empty());
        assert!(matches!(
            pool.slot(attached.slot),
            Some(SlotState::Attached(_))
        ));
        // Released after the resize: back to Ready, then dropped as stale.
        pool.release(attached.id);
        assert_eq!(pool.find_available(&mut backend), None);
        assert_eq!(backend.destroyed, vec![attached.id]);
    }

    #[test]
    fn failed_resize_keeps_the_old_size() {
        let size = Size::new(24, 12);
        let (mut image, mut pool, mut map) = parts(size);
        let mut rc = ResizeCoordinator::new();
        rc.on_size_hint(u32::MAX, u32::MAX, size);

        let err = rc
            .resize_buffers(&mut image, &mut pool, &mut map, &mut Backend::default())
            .unwrap_err();
        assert!(matches!(err, ResizeError::Image(ImageError::TooLarge(_))));
        assert_eq!(rc.state(), ResizeState::Idle);
        assert_eq!(image.size(), size);
        assert_eq!(pool.size(), size);
        assert_eq!(map.height(), 12);
    }

    #[test]
    fn nothing_pending_is_a_no_op() {
        let (mut image, mut pool, mut map) = parts(Size::new(8, 8));
        let mut rc = ResizeCoordinator::new();
        let outcome = rc
            .resize_buffers(&mut image, &mut pool, &mut map, &mut Backend::default())
            .unwrap();
        assert_eq!(outcome, ResizeOutcome::Idle);
    }
}
