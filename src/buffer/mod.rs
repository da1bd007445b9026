/*!
 * Growable Buffer
 * Contiguous element storage with capacity doubling
 */

use crate::core::errors::{MemoryError, MemoryResult};
use crate::core::types::{Size, DEFAULT_CAPACITY};
use crate::monitoring::{MemoryEvent, Observer};
use log::debug;
use serde::{Deserialize, Serialize};
use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::Arc;

/// Growable contiguous buffer of `T`
///
/// Capacity doubles whenever an append would overflow, so a sequence of N
/// pushes performs O(N) element moves in total at the cost of up to 2x
/// transient storage during a reallocation. Capacity only grows, never
/// shrinks, and storage is released exactly once, when the buffer drops.
///
/// Element access is checked: an index past the occupied length reports
/// [`MemoryError::OutOfRange`] instead of reading stale slots.
pub struct GrowBuf<T> {
    storage: NonNull<T>,
    capacity: Size,
    length: Size,
    observer: Option<Arc<dyn Observer>>,
    _marker: PhantomData<T>,
}

impl<T> GrowBuf<T> {
    /// Create a buffer with the default initial capacity
    pub fn new() -> MemoryResult<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer with a custom initial capacity
    ///
    /// An initial capacity of 0 is normalized to 1 so that doubling can make
    /// progress. Allocation failure surfaces as
    /// [`MemoryError::AllocationFailed`].
    pub fn with_capacity(initial: Size) -> MemoryResult<Self> {
        assert!(
            mem::size_of::<T>() != 0,
            "GrowBuf does not support zero-sized element types"
        );
        let capacity = initial.max(1);
        let storage = Self::alloc_storage(capacity)?;
        Ok(Self {
            storage,
            capacity,
            length: 0,
            observer: None,
            _marker: PhantomData,
        })
    }

    /// Attach an observer for growth diagnostics
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Append a value, doubling capacity first if the buffer is full
    pub fn push(&mut self, value: T) -> MemoryResult<()> {
        if self.length == self.capacity {
            self.grow()?;
        }
        unsafe {
            ptr::write(self.storage.as_ptr().add(self.length), value);
        }
        self.length += 1;
        Ok(())
    }

    /// Checked element access
    pub fn get(&self, index: usize) -> MemoryResult<&T> {
        if index >= self.length {
            return Err(MemoryError::OutOfRange {
                index,
                length: self.length,
            });
        }
        unsafe { Ok(&*self.storage.as_ptr().add(index)) }
    }

    /// Checked mutable element access
    pub fn get_mut(&mut self, index: usize) -> MemoryResult<&mut T> {
        if index >= self.length {
            return Err(MemoryError::OutOfRange {
                index,
                length: self.length,
            });
        }
        unsafe { Ok(&mut *self.storage.as_ptr().add(index)) }
    }

    /// Number of elements in use
    pub fn len(&self) -> Size {
        self.length
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Allocated capacity in element slots
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// View the occupied slots as a slice
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.storage.as_ptr(), self.length) }
    }

    /// View the occupied slots as a mutable slice
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.storage.as_ptr(), self.length) }
    }

    /// Buffer statistics snapshot
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            capacity: self.capacity,
            length: self.length,
            element_size: mem::size_of::<T>(),
        }
    }

    /// Double capacity and move the occupied slots into new storage
    ///
    /// The old storage is released as soon as the move completes; on
    /// allocation failure the buffer is left untouched.
    fn grow(&mut self) -> MemoryResult<()> {
        let old_capacity = self.capacity;
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(MemoryError::AllocationFailed {
                requested: Size::MAX,
            })?;
        let new_storage = Self::alloc_storage(new_capacity)?;

        unsafe {
            ptr::copy_nonoverlapping(self.storage.as_ptr(), new_storage.as_ptr(), self.length);
            Self::release_storage(self.storage, old_capacity);
        }
        self.storage = new_storage;
        self.capacity = new_capacity;

        debug!(
            "Buffer grown: {} -> {} slots ({} elements moved)",
            old_capacity, new_capacity, self.length
        );
        if let Some(ref observer) = self.observer {
            observer.emit(MemoryEvent::BufferGrown {
                old_capacity,
                new_capacity,
            });
        }
        Ok(())
    }

    fn alloc_storage(capacity: Size) -> MemoryResult<NonNull<T>> {
        let layout = Self::layout_for(capacity)?;
        let raw = unsafe { alloc::alloc(layout) } as *mut T;
        NonNull::new(raw).ok_or(MemoryError::AllocationFailed {
            requested: layout.size(),
        })
    }

    /// Release storage; `capacity` must match the allocation it came from
    unsafe fn release_storage(storage: NonNull<T>, capacity: Size) {
        if let Ok(layout) = Self::layout_for(capacity) {
            alloc::dealloc(storage.as_ptr() as *mut u8, layout);
        }
    }

    fn layout_for(capacity: Size) -> MemoryResult<Layout> {
        Layout::array::<T>(capacity).map_err(|_| MemoryError::AllocationFailed {
            requested: capacity.saturating_mul(mem::size_of::<T>()),
        })
    }
}

impl<T> Drop for GrowBuf<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.storage.as_ptr(),
                self.length,
            ));
            Self::release_storage(self.storage, self.capacity);
        }
        if let Some(ref observer) = self.observer {
            observer.emit(MemoryEvent::BufferReleased {
                capacity: self.capacity,
            });
        }
    }
}

unsafe impl<T: Send> Send for GrowBuf<T> {}
unsafe impl<T: Sync> Sync for GrowBuf<T> {}

impl<T: fmt::Debug> fmt::Debug for GrowBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Buffer statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferStats {
    pub capacity: Size,
    pub length: Size,
    pub element_size: Size,
}
