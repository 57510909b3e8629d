use serde::{Deserialize, Serialize};
use sramkit_protocol::Address;

/// A contiguous, already-written region of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// First byte of the region.
    pub start: Address,
    /// Length in bytes.
    pub len: u32,
}

impl Extent {
    pub fn new(start: Address, len: u32) -> Self {
        Self { start, len }
    }

    /// An empty extent. `start` carries no meaning for empty extents.
    pub fn empty(start: Address) -> Self {
        Self { start, len: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    ///
    /// Widened so that extents built by hand or deserialized cannot
    /// overflow; the result may exceed any device address.
    pub fn end(&self) -> u64 {
        u64::from(self.start) + u64::from(self.len)
    }

    /// Whether `address` lies inside the region.
    pub fn contains(&self, address: Address) -> bool {
        address >= self.start && u64::from(address) < self.end()
    }
}
