use bytes::{Buf, BufMut, BytesMut};

use crate::error::{ProtocolError, Result};
use crate::opcode::{Opcode, TransferMode};

/// Absolute byte offset into the device. Never a host pointer.
pub type Address = u32;

/// Command header: opcode (1) + address (3) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Addresses are framed as 24 bits; higher bits are dropped.
pub const ADDRESS_MASK: Address = 0x00FF_FFFF;

/// Largest capacity a 3-byte address can cover: 16 MiB.
pub const MAX_CAPACITY: u32 = 1 << 24;

/// Page size used by page-mode bursts.
pub const PAGE_SIZE: u32 = 32;

/// Encode a read/write command header.
///
/// Wire format:
/// ```text
/// ┌──────────┬───────────┬───────────┬───────────┐
/// │ Opcode   │ A[23..16] │ A[15..8]  │ A[7..0]   │
/// │ (1B)     │           │           │           │
/// └──────────┴───────────┴───────────┴───────────┘
/// ```
///
/// The address is masked to 24 bits. Keeping it below the device capacity
/// is the caller's contract.
pub fn encode_command(op: Opcode, address: Address, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_u8(op.byte());
    dst.put_uint(u64::from(address & ADDRESS_MASK), HEADER_SIZE - 1);
}

/// Decode a command header from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete header yet.
/// On success, consumes the header bytes from the buffer.
pub fn decode_command<B: Buf>(src: &mut B) -> Result<Option<(Opcode, Address)>> {
    if src.remaining() < HEADER_SIZE {
        return Ok(None);
    }

    let byte = src.get_u8();
    let op = Opcode::from_byte(byte).ok_or(ProtocolError::UnknownOpcode(byte))?;
    let address = src.get_uint(HEADER_SIZE - 1) as Address;
    Ok(Some((op, address)))
}

/// Status register values written for each transfer mode.
///
/// These are per-chip configuration constants, not computed: later chip
/// revisions expect `0x41` for sequential mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBits {
    pub byte: u8,
    pub page: u8,
    pub sequential: u8,
}

impl StatusBits {
    /// Status value for `mode`.
    pub fn bits(&self, mode: TransferMode) -> u8 {
        match mode {
            TransferMode::Byte => self.byte,
            TransferMode::Page => self.page,
            TransferMode::Sequential => self.sequential,
        }
    }
}

impl Default for StatusBits {
    fn default() -> Self {
        Self {
            byte: 0x00,
            page: 0x80,
            sequential: 0x40,
        }
    }
}

/// When the encoder re-sends the transfer mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModePolicy {
    /// Write the status register only when the cached mode differs.
    #[default]
    Cached,
    /// Write the status register before every multi-byte burst.
    EveryBurst,
}

/// Geometry and mode configuration for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Device size in bytes. Must be in `1..=MAX_CAPACITY`.
    pub capacity: u32,
    /// Status register values for each mode.
    pub status_bits: StatusBits,
    /// Mode re-send policy.
    pub mode_policy: ModePolicy,
}

impl DeviceConfig {
    /// A device of `capacity` bytes with default status bits.
    pub fn new(capacity: u32) -> Result<Self> {
        let config = Self {
            capacity,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// 1 Mbit part (23LC1024 class): 128 KiB.
    pub fn mbit1() -> Self {
        Self {
            capacity: 128 * 1024,
            status_bits: StatusBits::default(),
            mode_policy: ModePolicy::Cached,
        }
    }

    /// 8 Mbit part: 1 MiB, later revision sequential bits.
    pub fn mbit8() -> Self {
        Self {
            capacity: 1024 * 1024,
            status_bits: StatusBits {
                sequential: 0x41,
                ..StatusBits::default()
            },
            mode_policy: ModePolicy::Cached,
        }
    }

    /// Check that every address below `capacity` fits the address frame.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(ProtocolError::InvalidCapacity {
                capacity: self.capacity,
                max: MAX_CAPACITY,
            });
        }
        Ok(())
    }

    /// Whether `len` bytes starting at `address` lie inside the device.
    ///
    /// `address` itself must be a device address even when `len` is zero,
    /// since a header-only burst still puts it on the bus.
    pub fn contains(&self, address: Address, len: usize) -> bool {
        address < self.capacity
            && u64::from(address).saturating_add(len as u64) <= u64::from(self.capacity)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::mbit1()
    }
}
