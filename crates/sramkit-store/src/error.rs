use sramkit_marshal::MarshalError;

use crate::extent::Extent;

/// Errors that can occur in allocation and streaming.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Marshalling-level error (includes transport faults).
    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),

    /// The allocator cannot satisfy the request.
    #[error("out of space ({requested} bytes requested, {available} available)")]
    OutOfSpace { requested: usize, available: u32 },

    /// Zero-byte allocations are rejected.
    #[error("allocation size must be greater than zero")]
    EmptyAllocation,

    /// A stream ran out of device space; `written` is still valid.
    #[error(
        "capacity exceeded after {} bytes ({requested} bytes requested, {available} available)",
        .written.len
    )]
    CapacityExceeded {
        written: Extent,
        requested: usize,
        available: u32,
    },

    /// The stream source failed; `written` is still valid.
    #[error("source read failed after {} bytes: {source}", .written.len)]
    SourceRead {
        written: Extent,
        source: std::io::Error,
    },

    /// Chunk size must be greater than zero.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

impl StoreError {
    /// The extent written before the failure, for stream errors.
    pub fn written(&self) -> Option<Extent> {
        match self {
            Self::CapacityExceeded { written, .. } | Self::SourceRead { written, .. } => {
                Some(*written)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
