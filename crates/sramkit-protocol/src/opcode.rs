//! Device opcodes and status-register transfer modes.
//!
//! Opcode values are fixed by the 23LCxxx datasheet.

/// Mode bits within the status register (bits 7..6).
pub const MODE_MASK: u8 = 0xC0;

/// A device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Write the status (mode) register.
    WriteStatus = 0x01,
    /// Write data starting at an address.
    Write = 0x02,
    /// Read data starting at an address.
    Read = 0x03,
    /// Read the status (mode) register.
    ReadStatus = 0x05,
    /// Return the device to plain SPI I/O.
    ResetIo = 0xFF,
}

impl Opcode {
    /// Every supported opcode, in wire-value order.
    pub const ALL: [Opcode; 5] = [
        Self::WriteStatus,
        Self::Write,
        Self::Read,
        Self::ReadStatus,
        Self::ResetIo,
    ];

    /// The opcode byte as sent on the wire.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Parse an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::WriteStatus),
            0x02 => Some(Self::Write),
            0x03 => Some(Self::Read),
            0x05 => Some(Self::ReadStatus),
            0xFF => Some(Self::ResetIo),
            _ => None,
        }
    }

    /// Whether the opcode is followed by a 3-byte address.
    pub const fn is_addressed(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }

    /// Datasheet mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::WriteStatus => "WRSR",
            Self::Write => "WRITE",
            Self::Read => "READ",
            Self::ReadStatus => "RDSR",
            Self::ResetIo => "RSTIO",
        }
    }
}

/// How far one read/write burst may advance the device's address counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferMode {
    /// One data byte per burst.
    Byte,
    /// The counter wraps within a 32-byte page.
    Page,
    /// The counter runs across the whole array, wrapping at the end.
    Sequential,
}

impl TransferMode {
    /// Decode the mode from a status register value.
    ///
    /// Returns `None` for the reserved pattern `0b11`.
    pub fn from_status(status: u8) -> Option<Self> {
        match status & MODE_MASK {
            0x00 => Some(Self::Byte),
            0x80 => Some(Self::Page),
            0x40 => Some(Self::Sequential),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Page => "page",
            Self::Sequential => "sequential",
        }
    }
}
