#![forbid(unsafe_code)]

//! Recyclable pool of presentable frame buffers.
//!
//! Each slot is [`SlotState::Empty`], [`SlotState::Ready`] (owned by the
//! pool, safe to write) or [`SlotState::Attached`] (owned by the display
//! server until it sends a release). A buffer is only ever written while it
//! is `Ready`, and an attached buffer comes back only through
//! [`FramePool::release`].
//!
//! # Invariants
//!
//! 1. `populate` never selects an attached buffer.
//! 2. Ready buffers whose size differs from the pool size are destroyed the
//!    next time the pool scans for a free buffer.
//! 3. Every buffer created through the backend is destroyed through it
//!    exactly once (teardown, shutdown or an orphaned release).
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | No ready buffer and no empty slot | [`PoolError::Exhausted`] |
//! | Shared memory unavailable | [`PoolError::Shm`] |
//! | Image and pool sizes differ | [`PoolError::SizeMismatch`] |
//! | Release of an unknown buffer | [`ReleaseOutcome::Orphaned`], caller destroys it |

use crate::image::LogicalImage;
use crate::shm::{ShmError, ShmSegment, pixel_buffer_size};
use phosphor_core::event::BufferId;
use phosphor_core::geometry::Size;
use std::fmt;

/// Default number of pool slots.
pub const DEFAULT_POOL_SLOTS: usize = 10;

/// Errors from the frame pool.
#[derive(Debug)]
pub enum PoolError {
    /// Every slot holds an attached buffer.
    Exhausted { slots: usize },
    Shm(ShmError),
    /// The display server refused to wrap a segment.
    Backend(String),
    SizeMismatch { pool: Size, image: Size },
    /// Slot index out of range or not empty.
    InvalidSlot(usize),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { slots } => write!(f, "all {slots} frame buffers are in use"),
            Self::Shm(e) => write!(f, "frame buffer memory: {e}"),
            Self::Backend(msg) => write!(f, "display server buffer: {msg}"),
            Self::SizeMismatch { pool, image } => write!(
                f,
                "image {}x{} does not match pool {}x{}",
                image.width, image.height, pool.width, pool.height
            ),
            Self::InvalidSlot(slot) => write!(f, "slot {slot} cannot take a new buffer"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Shm(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShmError> for PoolError {
    fn from(e: ShmError) -> Self {
        Self::Shm(e)
    }
}

/// The part of the display server that wraps segments into buffers.
pub trait BufferBackend {
    /// Register `segment` as an `ARGB8888` buffer of `size` with `stride`
    /// bytes per row.
    fn create_buffer(
        &mut self,
        segment: &ShmSegment,
        size: Size,
        stride: u32,
    ) -> Result<BufferId, PoolError>;

    /// Forget a buffer created by [`BufferBackend::create_buffer`].
    fn destroy_buffer(&mut self, id: BufferId);
}

/// A shared-memory segment registered with the display server.
#[derive(Debug)]
pub struct FrameBuffer {
    id: BufferId,
    size: Size,
    segment: ShmSegment,
}

impl FrameBuffer {
    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        self.segment.as_slice()
    }
}

/// State of one pool slot.
#[derive(Debug, Default)]
pub enum SlotState {
    #[default]
    Empty,
    Ready(FrameBuffer),
    Attached(FrameBuffer),
}

impl SlotState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ready(_) => "ready",
            Self::Attached(_) => "attached",
        }
    }

    fn buffer(&self) -> Option<&FrameBuffer> {
        match self {
            Self::Empty => None,
            Self::Ready(b) | Self::Attached(b) => Some(b),
        }
    }
}

/// A buffer handed to the display server by [`FramePool::populate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentedBuffer {
    pub slot: usize,
    pub id: BufferId,
}

/// Result of a release notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The buffer is back in the pool.
    Recycled { slot: usize },
    /// The pool does not own this buffer; destroy it.
    Orphaned,
}

/// Slot counts by state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolCounts {
    pub empty: usize,
    pub ready: usize,
    pub attached: usize,
}

/// Fixed-size set of frame buffer slots.
#[derive(Debug)]
pub struct FramePool {
    slots: Vec<SlotState>,
    size: Size,
    buffer_len: usize,
}

impl FramePool {
    /// Pool of `slots` empty slots for frames of `size`.
    pub fn new(slots: usize, size: Size) -> Result<Self, PoolError> {
        Ok(Self {
            slots: std::iter::repeat_with(SlotState::default).take(slots).collect(),
            size,
            buffer_len: pixel_buffer_size(size)?,
        })
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bytes per segment at the current size.
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, slot: usize) -> Option<&SlotState> {
        self.slots.get(slot)
    }

    pub fn counts(&self) -> PoolCounts {
        self.slots.iter().fold(PoolCounts::default(), |mut c, s| {
            match s {
                SlotState::Empty => c.empty += 1,
                SlotState::Ready(_) => c.ready += 1,
                SlotState::Attached(_) => c.attached += 1,
            }
            c
        })
    }

    /// Switch to frames of `size`; existing buffers are left for the next
    /// scan or [`FramePool::teardown_available`].
    pub fn set_size(&mut self, size: Size) -> Result<(), PoolError> {
        self.buffer_len = pixel_buffer_size(size)?;
        self.size = size;
        Ok(())
    }

    /// First ready buffer of the current size. Stale-size ready buffers seen
    /// on the way are destroyed and their slots emptied.
    pub fn find_available(&mut self, backend: &mut dyn BufferBackend) -> Option<usize> {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let SlotState::Ready(buffer) = slot else {
                continue;
            };
            if buffer.size == self.size {
                return Some(idx);
            }
            tracing::debug!(
                slot = idx,
                id = buffer.id.0,
                width = buffer.size.width,
                height = buffer.size.height,
                "destroying stale frame buffer"
            );
            backend.destroy_buffer(buffer.id);
            *slot = SlotState::Empty;
        }
        None
    }

    /// First slot without a buffer.
    pub fn find_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| matches!(s, SlotState::Empty))
    }

    /// Allocate a segment for `slot`, register it and mark it ready.
    pub fn create_buffer(
        &mut self,
        slot: usize,
        backend: &mut dyn BufferBackend,
    ) -> Result<BufferId, PoolError> {
        if !matches!(self.slots.get(slot), Some(SlotState::Empty)) {
            return Err(PoolError::InvalidSlot(slot));
        }
        let segment = ShmSegment::create(self.buffer_len)?;
        let stride = self.size.width.saturating_mul(4);
        let id = backend.create_buffer(&segment, self.size, stride)?;
        tracing::debug!(slot, id = id.0, len = self.buffer_len, "frame buffer created");
        self.slots[slot] = SlotState::Ready(FrameBuffer {
            id,
            size: self.size,
            segment,
        });
        Ok(id)
    }

    /// Copy `image` into a ready buffer (creating one if needed) and mark it
    /// attached.
    pub fn populate(
        &mut self,
        image: &LogicalImage,
        backend: &mut dyn BufferBackend,
    ) -> Result<PresentedBuffer, PoolError> {
        if image.size() != self.size {
            return Err(PoolError::SizeMismatch {
                pool: self.size,
                image: image.size(),
            });
        }
        let slot = match self.find_available(backend) {
            Some(slot) => slot,
            None => {
                let slot = self.find_empty_slot().ok_or(PoolError::Exhausted {
                    slots: self.slots.len(),
                })?;
                self.create_buffer(slot, backend)?;
                slot
            }
        };

        let mut buffer = match std::mem::take(&mut self.slots[slot]) {
            SlotState::Ready(buffer) => buffer,
            other => {
                self.slots[slot] = other;
                return Err(PoolError::InvalidSlot(slot));
            }
        };
        buffer.segment.write(image.as_bytes());
        let id = buffer.id;
        self.slots[slot] = SlotState::Attached(buffer);
        Ok(PresentedBuffer { slot, id })
    }

    /// Pixels of the buffer in `slot`.
    pub fn bytes(&self, slot: usize) -> Option<&[u8]> {
        self.slots.get(slot)?.buffer().map(FrameBuffer::bytes)
    }

    /// The display server finished reading buffer `id`.
    pub fn release(&mut self, id: BufferId) -> ReleaseOutcome {
        let Some(slot) = self
            .slots
            .iter()
            .position(|s| s.buffer().is_some_and(|b| b.id == id))
        else {
            return ReleaseOutcome::Orphaned;
        };
        if let SlotState::Attached(buffer) = std::mem::take(&mut self.slots[slot]) {
            self.slots[slot] = SlotState::Ready(buffer);
        } else {
            tracing::warn!(slot, id = id.0, "release for a buffer that was not attached");
        }
        ReleaseOutcome::Recycled { slot }
    }

    /// Destroy every ready buffer. Returns how many were destroyed.
    pub fn teardown_available(&mut self, backend: &mut dyn BufferBackend) -> usize {
        let mut destroyed = 0;
        for slot in &mut self.slots {
            if let SlotState::Ready(buffer) = slot {
                backend.destroy_buffer(buffer.id);
                *slot = SlotState::Empty;
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Destroy every buffer, attached or not.
    pub fn shutdown(&mut self, backend: &mut dyn BufferBackend) {
        for slot in &mut self.slots {
            if let Some(buffer) = slot.buffer() {
                backend.destroy_buffer(buffer.id);
            }
            *slot = SlotState::Empty;
        }
    }
}
