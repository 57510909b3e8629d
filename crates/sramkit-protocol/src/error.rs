use sramkit_transport::TransportError;

/// Errors that can occur while framing or issuing device commands.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Transport-level fault, passed through without interpretation.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The configured capacity cannot be addressed with a 3-byte address.
    #[error("invalid device capacity ({capacity} bytes, must be 1..={max})")]
    InvalidCapacity { capacity: u32, max: u32 },

    /// The status register holds the reserved mode bit pattern.
    #[error("unexpected status register value 0x{0:02X}")]
    UnexpectedStatus(u8),

    /// A command header started with a byte that is not a known opcode.
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
