/*!
 * Allocation Instrumentation
 * Injectable hooks for observing allocation and deallocation events
 */

use crate::core::types::Size;
use log::debug;
use serde::{Deserialize, Serialize};

/// Allocation lifecycle event
///
/// Emission is diagnostic only and never part of the functional contract;
/// a primitive with no observer attached emits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryEvent {
    /// Buffer storage was reallocated to a larger capacity
    BufferGrown {
        old_capacity: Size,
        new_capacity: Size,
    },
    /// Buffer storage was released at destruction
    BufferReleased { capacity: Size },
    /// Pool handed a block to a caller
    BlockIssued { size: Size, recycled: bool },
    /// Caller returned a block to the pool free list
    BlockReturned { size: Size },
    /// Pool teardown: free-list blocks freed, issued blocks leaked
    PoolDrained { freed: usize, leaked: usize },
}

/// Sink for allocation events, supplied by the embedding program
pub trait Observer: Send + Sync {
    fn emit(&self, event: MemoryEvent);
}

/// Observer that forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn emit(&self, event: MemoryEvent) {
        match event {
            MemoryEvent::BufferGrown {
                old_capacity,
                new_capacity,
            } => debug!("Buffer grown: {} -> {} slots", old_capacity, new_capacity),
            MemoryEvent::BufferReleased { capacity } => {
                debug!("Buffer released: {} slots", capacity)
            }
            MemoryEvent::BlockIssued { size, recycled } => {
                debug!("Block issued: {} bytes (recycled: {})", size, recycled)
            }
            MemoryEvent::BlockReturned { size } => debug!("Block returned: {} bytes", size),
            MemoryEvent::PoolDrained { freed, leaked } => {
                debug!("Pool drained: {} blocks freed, {} leaked", freed, leaked)
            }
        }
    }
}
