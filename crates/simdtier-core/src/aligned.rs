//! Owned `f32` buffers aligned for vector loads.
//!
//! [`AlignedBuffer`] allocates zeroed memory aligned to the selected tier's
//! register width, so its contents can be used with [`SimdOps::load`] and
//! [`SimdOps::store`](crate::SimdOps::store). Memory is freed on drop.
//!
//! ```rust
//! use simdtier_core::{required_alignment, AlignedBuffer};
//!
//! let mut buf = AlignedBuffer::zeroed(100)?;
//! buf[3] = 1.5;
//! assert_eq!(buf.as_ptr() as usize % required_alignment(), 0);
//! assert_eq!(buf.iter().sum::<f32>(), 1.5);
//! # Ok::<(), simdtier_core::Error>(())
//! ```
//!
//! [`SimdOps::load`]: crate::SimdOps::load

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::selector::required_alignment;

/// Heap buffer of `f32` with a guaranteed minimum alignment.
pub struct AlignedBuffer {
    ptr: NonNull<f32>,
    len: usize,
    align: usize,
    /// `None` for empty buffers, which own no allocation.
    layout: Option<Layout>,
}

impl AlignedBuffer {
    /// `len` zeros aligned to [`required_alignment`].
    pub fn zeroed(len: usize) -> Result<Self> {
        Self::with_alignment(len, required_alignment())
    }

    /// Copy of `values` aligned to [`required_alignment`].
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        let mut buf = Self::zeroed(values.len())?;
        buf.copy_from_slice(values);
        Ok(buf)
    }

    /// `len` zeros aligned to `align` bytes.
    ///
    /// `align` must be a power of two; it is raised to `f32` alignment if
    /// smaller.
    pub fn with_alignment(len: usize, align: usize) -> Result<Self> {
        let align = align.max(std::mem::align_of::<f32>());
        let invalid = || Error::InvalidLayout { len, align };

        let bytes = len.checked_mul(std::mem::size_of::<f32>()).ok_or_else(invalid)?;
        let layout = Layout::from_size_align(bytes, align).map_err(|_| invalid())?;

        if bytes == 0 {
            // Dangling but aligned, never dereferenced for a non-empty slice.
            let dangling = std::ptr::without_provenance_mut::<f32>(align);
            let ptr = NonNull::new(dangling).ok_or_else(invalid)?;
            return Ok(Self {
                ptr,
                len: 0,
                align,
                layout: None,
            });
        }

        // SAFETY: `alloc_zeroed` requires a non-zero-sized layout.
        // - Condition 1: `bytes > 0` is checked above.
        // - Condition 2: `layout` was validated by `Layout::from_size_align`.
        // Reason: the global allocator is the only way to get over-aligned heap memory.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<f32>())
            .ok_or(Error::AllocationFailed { bytes, align })?;

        Ok(Self {
            ptr,
            len,
            align,
            layout: Some(layout),
        })
    }

    /// Alignment of the allocation in bytes.
    #[must_use]
    pub fn alignment(&self) -> usize {
        self.align
    }

    /// Raw pointer to the first element.
    #[must_use]
    pub fn as_ptr(&self) -> *const f32 {
        self.ptr.as_ptr()
    }

    /// Mutable raw pointer to the first element.
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut f32 {
        self.ptr.as_ptr()
    }
}

impl Deref for AlignedBuffer {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        // SAFETY: `ptr` is valid for `len` initialized (zeroed) f32 values,
        // or dangling and aligned with `len == 0`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [f32] {
        // SAFETY: as in `deref`; `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Clone for AlignedBuffer {
    fn clone(&self) -> Self {
        let mut copy = match Self::with_alignment(self.len, self.alignment()) {
            Ok(copy) => copy,
            Err(_) => std::alloc::handle_alloc_error(
                self.layout.unwrap_or_else(Layout::new::<f32>),
            ),
        };
        copy.copy_from_slice(self);
        copy
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("alignment", &self.alignment())
            .finish_non_exhaustive()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            // SAFETY: `dealloc` requires the original pointer/layout pair.
            // - Condition 1: `ptr` came from `alloc_zeroed(layout)` in `with_alignment`.
            // - Condition 2: `drop` runs at most once.
            unsafe { dealloc(self.ptr.as_ptr().cast::<u8>(), layout) }
        }
    }
}

// SAFETY: `AlignedBuffer` uniquely owns its allocation, like `Vec<f32>`.
unsafe impl Send for AlignedBuffer {}

// SAFETY: shared access only hands out `&[f32]`.
unsafe impl Sync for AlignedBuffer {}
