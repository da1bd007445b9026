/*!
 * Core Types
 * Common types and limits shared across the primitives
 */

/// Size type for memory operations (bytes or element slots)
pub type Size = usize;

/// Raw block address, used for bookkeeping and diagnostics
pub type BlockAddr = usize;

/// Default initial capacity for growable buffers (element slots)
pub const DEFAULT_CAPACITY: Size = 2;

/// Default pool block size in bytes
pub const DEFAULT_BLOCK_SIZE: Size = 32;
