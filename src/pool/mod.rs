/*!
 * Fixed-Block Pool
 * LIFO free-list allocator for equally sized memory blocks
 */

use crate::core::errors::{MemoryError, MemoryResult};
use crate::core::types::{BlockAddr, Size, DEFAULT_BLOCK_SIZE};
use crate::monitoring::{MemoryEvent, Observer};
use ahash::RandomState;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::alloc::{self, Layout};
use std::collections::HashSet;
use std::fmt;
use std::mem;
use std::ptr::NonNull;
use std::slice;
use std::sync::Arc;

/// Alignment for pool blocks, sufficient for any word-sized payload
const BLOCK_ALIGN: usize = mem::align_of::<usize>();

/// Opaque handle to a pool block
///
/// The handle is a linear token: returning it to the pool consumes it, so a
/// block cannot be freed twice or used after return. Blocks are zeroed when
/// first obtained from the general allocator; a recycled block keeps the
/// contents its previous holder wrote.
///
/// Dropping a handle without returning it leaks the block, matching the
/// pool's hand-out-and-trust contract.
#[derive(Debug)]
pub struct BlockHandle {
    ptr: NonNull<u8>,
    size: Size,
}

impl BlockHandle {
    /// Block address for bookkeeping and diagnostics
    pub fn address(&self) -> BlockAddr {
        self.ptr.as_ptr() as BlockAddr
    }

    /// Block size in bytes
    pub fn size(&self) -> Size {
        self.size
    }

    /// Read the block bytes
    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    /// Write the block bytes
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }
}

// A handle owns its block until returned
unsafe impl Send for BlockHandle {}
unsafe impl Sync for BlockHandle {}

/// Fixed-block pool allocator
///
/// Pre-populates a free list of equally sized blocks and recycles them in
/// LIFO order. When the free list is empty, allocation falls back to the
/// general allocator and still succeeds; the fallback block joins the pool's
/// recycling once returned.
///
/// Every issued address is tracked, so returning a block that did not come
/// from this pool is a reported [`MemoryError::ForeignBlock`] rather than
/// silent free-list corruption. Blocks still issued when the pool drops are
/// deliberately leaked, which also keeps outstanding handles from dangling.
pub struct FixedPool {
    block_size: Size,
    layout: Layout,
    free_list: Vec<NonNull<u8>>,
    issued: HashSet<BlockAddr, RandomState>,
    recycled_allocations: u64,
    fallback_allocations: u64,
    observer: Option<Arc<dyn Observer>>,
}

impl FixedPool {
    /// Create a pool pre-populated with `initial_count` default-size blocks
    pub fn new(initial_count: usize) -> MemoryResult<Self> {
        Self::with_block_size(initial_count, DEFAULT_BLOCK_SIZE)
    }

    /// Create a pool with a custom block size
    pub fn with_block_size(initial_count: usize, block_size: Size) -> MemoryResult<Self> {
        if block_size == 0 {
            return Err(MemoryError::AllocationFailed { requested: 0 });
        }
        let layout = Layout::from_size_align(block_size, BLOCK_ALIGN).map_err(|_| {
            MemoryError::AllocationFailed {
                requested: block_size,
            }
        })?;

        let mut pool = Self {
            block_size,
            layout,
            free_list: Vec::with_capacity(initial_count),
            issued: HashSet::with_hasher(RandomState::new()),
            recycled_allocations: 0,
            fallback_allocations: 0,
            observer: None,
        };
        for _ in 0..initial_count {
            let block = pool.fresh_block()?;
            pool.free_list.push(block);
        }

        info!(
            "Pool initialized with {} blocks of {} bytes",
            initial_count, block_size
        );
        Ok(pool)
    }

    /// Attach an observer for allocation diagnostics
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Hand out a block, recycling the most recently returned one first
    ///
    /// When the free list is empty the block comes straight from the general
    /// allocator; such a block is indistinguishable from a pooled one.
    pub fn allocate(&mut self) -> MemoryResult<BlockHandle> {
        let (ptr, recycled) = match self.free_list.pop() {
            Some(ptr) => {
                self.recycled_allocations += 1;
                (ptr, true)
            }
            None => {
                let ptr = self.fresh_block()?;
                self.fallback_allocations += 1;
                debug!(
                    "Pool empty, fell back to the general allocator for {} bytes",
                    self.block_size
                );
                (ptr, false)
            }
        };
        self.issued.insert(ptr.as_ptr() as BlockAddr);

        if let Some(ref observer) = self.observer {
            observer.emit(MemoryEvent::BlockIssued {
                size: self.block_size,
                recycled,
            });
        }
        Ok(BlockHandle {
            ptr,
            size: self.block_size,
        })
    }

    /// Return a block to the free list
    ///
    /// Only handles issued by this pool are accepted; a foreign handle is
    /// rejected with [`MemoryError::ForeignBlock`] and its storage leaks
    /// rather than being freed through the wrong pool.
    pub fn deallocate(&mut self, block: BlockHandle) -> MemoryResult<()> {
        let address = block.address();
        if !self.issued.remove(&address) {
            warn!(
                "Rejected return of block 0x{:x}: not issued by this pool",
                address
            );
            return Err(MemoryError::ForeignBlock { address });
        }
        self.free_list.push(block.ptr);

        if let Some(ref observer) = self.observer {
            observer.emit(MemoryEvent::BlockReturned {
                size: self.block_size,
            });
        }
        Ok(())
    }

    /// Fixed block size in bytes
    pub fn block_size(&self) -> Size {
        self.block_size
    }

    /// Blocks currently available for allocation
    pub fn free_blocks(&self) -> usize {
        self.free_list.len()
    }

    /// Blocks currently held by callers
    pub fn issued_blocks(&self) -> usize {
        self.issued.len()
    }

    /// Pool statistics snapshot
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            block_size: self.block_size,
            free_blocks: self.free_list.len(),
            issued_blocks: self.issued.len(),
            recycled_allocations: self.recycled_allocations,
            fallback_allocations: self.fallback_allocations,
        }
    }

    fn fresh_block(&self) -> MemoryResult<NonNull<u8>> {
        let raw = unsafe { alloc::alloc_zeroed(self.layout) };
        NonNull::new(raw).ok_or(MemoryError::AllocationFailed {
            requested: self.block_size,
        })
    }
}

impl Drop for FixedPool {
    fn drop(&mut self) {
        let freed = self.free_list.len();
        let leaked = self.issued.len();

        for ptr in self.free_list.drain(..) {
            unsafe { alloc::dealloc(ptr.as_ptr(), self.layout) };
        }
        if leaked > 0 {
            warn!(
                "Pool dropped with {} blocks still issued; their storage is leaked",
                leaked
            );
        }
        debug!("Pool drained: {} blocks freed, {} leaked", freed, leaked);

        if let Some(ref observer) = self.observer {
            observer.emit(MemoryEvent::PoolDrained { freed, leaked });
        }
    }
}

// The pool owns its blocks; moving it between threads is sound
unsafe impl Send for FixedPool {}

impl fmt::Debug for FixedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("block_size", &self.block_size)
            .field("free_blocks", &self.free_list.len())
            .field("issued_blocks", &self.issued.len())
            .finish()
    }
}

/// Pool statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    pub block_size: Size,
    pub free_blocks: usize,
    pub issued_blocks: usize,
    pub recycled_allocations: u64,
    pub fallback_allocations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recycles_returned_block() {
        let mut pool = FixedPool::new(1).unwrap();

        let block = pool.allocate().unwrap();
        let address = block.address();
        pool.deallocate(block).unwrap();

        let block = pool.allocate().unwrap();
        assert_eq!(block.address(), address);
    }

    #[test]
    fn test_exhaustion_falls_back() {
        let mut pool = FixedPool::new(0).unwrap();

        let block = pool.allocate().unwrap();
        assert_eq!(block.size(), DEFAULT_BLOCK_SIZE);
        assert_eq!(pool.stats().fallback_allocations, 1);
    }

    #[test]
    fn test_foreign_block_rejected() {
        let mut pool_a = FixedPool::new(1).unwrap();
        let mut pool_b = FixedPool::new(1).unwrap();

        let block = pool_a.allocate().unwrap();
        let address = block.address();

        let result = pool_b.deallocate(block);
        assert_eq!(result, Err(MemoryError::ForeignBlock { address }));
        // The block is still accounted to pool A
        assert_eq!(pool_a.issued_blocks(), 1);
    }

    #[test]
    fn test_blocks_born_zeroed() {
        let mut pool = FixedPool::with_block_size(1, 16).unwrap();
        let block = pool.allocate().unwrap();
        assert!(block.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let result = FixedPool::with_block_size(1, 0);
        assert_eq!(
            result.err(),
            Some(MemoryError::AllocationFailed { requested: 0 })
        );
    }

    #[test]
    fn test_stats() {
        let mut pool = FixedPool::new(2).unwrap();
        let block = pool.allocate().unwrap();

        let stats = pool.stats();
        assert_eq!(stats.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(stats.free_blocks, 1);
        assert_eq!(stats.issued_blocks, 1);
        assert_eq!(stats.recycled_allocations, 1);
        assert_eq!(stats.fallback_allocations, 0);

        pool.deallocate(block).unwrap();
    }
}
