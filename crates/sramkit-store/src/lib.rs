//! Address-space management for a serial SRAM.
//!
//! This is the "just works" layer: a bump allocator hands out
//! non-overlapping address ranges, the stream writer copies a byte source
//! into the device chunk by chunk, and [`Sram`] ties both to one marshaller.

pub mod allocator;
pub mod error;
pub mod extent;
pub mod sram;
pub mod stream;

pub use allocator::{AllocatorConfig, BumpAllocator};
pub use error::{Result, StoreError};
pub use extent::Extent;
pub use sram::Sram;
pub use stream::{write_stream, ChunkWriter, StreamConfig, DEFAULT_CHUNK_SIZE};
