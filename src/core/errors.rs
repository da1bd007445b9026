/*!
 * Error Types
 * Caller-visible failure taxonomy for the memory primitives
 */

use crate::core::types::{BlockAddr, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
///
/// These surface to the embedding program as reported values; none are
/// recovered internally and no operation retries.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryError {
    #[error("Index out of range: index {index}, length {length}")]
    OutOfRange { index: usize, length: usize },

    #[error("Allocation failed: requested {requested} bytes")]
    AllocationFailed { requested: Size },

    #[error("Block at 0x{address:x} was not issued by this pool")]
    ForeignBlock { address: BlockAddr },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MemoryError::OutOfRange {
            index: 7,
            length: 3,
        };
        assert_eq!(err.to_string(), "Index out of range: index 7, length 3");

        let err = MemoryError::ForeignBlock { address: 0xdead };
        assert_eq!(
            err.to_string(),
            "Block at 0xdead was not issued by this pool"
        );
    }
}
