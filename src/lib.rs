/*!
 * memkit
 * Manual memory-management primitives: a growable contiguous buffer, a
 * fixed-block pool allocator, and a reference-counted shared handle
 */

pub mod buffer;
pub mod core;
pub mod monitoring;
pub mod pool;
pub mod shared;

// Re-exports
pub use self::core::{MemoryError, MemoryResult};
pub use buffer::{BufferStats, GrowBuf};
pub use monitoring::{LogObserver, MemoryEvent, Observer};
pub use pool::{BlockHandle, FixedPool, PoolStats};
pub use shared::{RefCounter, Shared};
