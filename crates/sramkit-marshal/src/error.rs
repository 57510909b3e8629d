use sramkit_protocol::{Address, ProtocolError};

/// Errors that can occur while reading or writing typed values.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// Protocol-level error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The access would run past the end of the device.
    #[error("access of {len} bytes at 0x{address:06X} exceeds device capacity ({capacity} bytes)")]
    OutOfBounds {
        address: Address,
        len: usize,
        capacity: u32,
    },
}

pub type Result<T> = std::result::Result<T, MarshalError>;
