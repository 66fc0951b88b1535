#![allow(unsafe_code)]

//! Shared-memory segments backing presentable frame buffers.
//!
//! A segment is an unlinked temporary file (on `/dev/shm` when available)
//! mapped read-write into the process. The display server receives the file
//! descriptor through [`AsFd`]; dropping the segment unmaps the memory and
//! closes the file.

use memmap2::MmapMut;
use phosphor_core::geometry::Size;
use std::fmt;
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::path::Path;
use std::sync::OnceLock;

const SHM_DIR: &str = "/dev/shm";
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Errors creating a [`ShmSegment`].
#[derive(Debug)]
pub enum ShmError {
    /// Requested a zero-length segment.
    Empty,
    /// Size arithmetic overflowed.
    SizeOverflow(Size),
    Create(io::Error),
    Resize(io::Error),
    Map(io::Error),
}

impl fmt::Display for ShmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "zero-length shared memory segment"),
            Self::SizeOverflow(s) => {
                write!(f, "buffer size for {}x{} overflows", s.width, s.height)
            }
            Self::Create(e) => write!(f, "creating shared memory file: {e}"),
            Self::Resize(e) => write!(f, "sizing shared memory file: {e}"),
            Self::Map(e) => write!(f, "mapping shared memory: {e}"),
        }
    }
}

impl std::error::Error for ShmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Create(e) | Self::Resize(e) | Self::Map(e) => Some(e),
            Self::Empty | Self::SizeOverflow(_) => None,
        }
    }
}

/// System page size in bytes.
pub fn page_size() -> usize {
    static PAGE: OnceLock<usize> = OnceLock::new();
    *PAGE.get_or_init(|| {
        // SAFETY: sysconf has no preconditions and only reads system state.
        let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        usize::try_from(raw)
            .ok()
            .filter(|&p| p > 0)
            .unwrap_or(FALLBACK_PAGE_SIZE)
    })
}

/// Bytes reserved for a frame of `size`: `width * height * 4` rounded up to
/// whole pages, always leaving at least one spare page.
pub fn pixel_buffer_size(size: Size) -> Result<usize, ShmError> {
    buffer_size_with_page(size, page_size())
}

fn buffer_size_with_page(size: Size, page: usize) -> Result<usize, ShmError> {
    (size.width as usize)
        .checked_mul(size.height as usize)
        .and_then(|n| n.checked_mul(4))
        .and_then(|bytes| (bytes / page).checked_add(1))
        .and_then(|pages| pages.checked_mul(page))
        .ok_or(ShmError::SizeOverflow(size))
}

/// An owned, mapped shared-memory file.
pub struct ShmSegment {
    file: File,
    map: MmapMut,
}

impl ShmSegment {
    /// Create and map a zero-filled segment of `len` bytes.
    pub fn create(len: usize) -> Result<Self, ShmError> {
        if len == 0 {
            return Err(ShmError::Empty);
        }
        let file = if Path::new(SHM_DIR).is_dir() {
            tempfile::tempfile_in(SHM_DIR).or_else(|_| tempfile::tempfile())
        } else {
            tempfile::tempfile()
        }
        .map_err(ShmError::Create)?;
        file.set_len(len as u64).map_err(ShmError::Resize)?;

        // SAFETY: the file is private to this process (unlinked on creation)
        // and sized above; nothing else truncates it while mapped.
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(ShmError::Map)?;
        tracing::trace!(len, "shared memory segment mapped");
        Ok(Self { file, map })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map
    }

    /// Copy `bytes` to the start of the segment. Returns `false` when they do
    /// not fit.
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        match self.map.get_mut(..bytes.len()) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }
}

impl AsFd for ShmSegment {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl fmt::Debug for ShmSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShmSegment").field("len", &self.len()).finish()
    }
}
