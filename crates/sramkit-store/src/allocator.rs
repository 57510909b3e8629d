use sramkit_protocol::{Address, DeviceConfig};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

/// Allocator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// First address handed out. Space below it is left to the caller.
    pub base: Address,
}

/// Append-only address allocator.
///
/// Hands out contiguous, non-overlapping ranges in strictly increasing
/// order. There is no free; the only way to reclaim space is [`reset`],
/// which makes every earlier allocation invalid.
///
/// [`reset`]: BumpAllocator::reset
#[derive(Debug, Clone)]
pub struct BumpAllocator {
    base: Address,
    cursor: Address,
    capacity: u32,
}

impl BumpAllocator {
    /// An allocator covering `base..capacity`.
    ///
    /// A base beyond the device is clamped to the capacity, leaving no space.
    pub fn new(capacity: u32, config: AllocatorConfig) -> Self {
        let base = config.base.min(capacity);
        Self {
            base,
            cursor: base,
            capacity,
        }
    }

    /// An allocator over the whole device described by `config`.
    pub fn for_device(config: &DeviceConfig) -> Self {
        Self::new(config.capacity, AllocatorConfig::default())
    }

    /// Reserve `size` bytes and return their start address.
    ///
    /// On failure the cursor is left untouched.
    pub fn allocate(&mut self, size: usize) -> Result<Address> {
        if size == 0 {
            return Err(StoreError::EmptyAllocation);
        }
        let available = self.remaining();
        if size as u64 > u64::from(available) {
            warn!(requested = size, available, "allocation refused");
            return Err(StoreError::OutOfSpace {
                requested: size,
                available,
            });
        }

        let address = self.cursor;
        // size <= available <= capacity, so this fits in u32.
        self.cursor += size as u32;
        debug!(address, size, cursor = self.cursor, "allocated");
        Ok(address)
    }

    /// Next address to be handed out.
    pub fn cursor(&self) -> Address {
        self.cursor
    }

    /// Bytes still available.
    pub fn remaining(&self) -> u32 {
        self.capacity - self.cursor
    }

    /// Bytes handed out since the last reset.
    pub fn used(&self) -> u32 {
        self.cursor - self.base
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn base(&self) -> Address {
        self.base
    }

    /// Rewind to the base address. Every earlier allocation becomes invalid.
    pub fn reset(&mut self) {
        debug!(base = self.base, discarded = self.used(), "allocator reset");
        self.cursor = self.base;
    }
}
