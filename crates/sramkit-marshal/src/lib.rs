//! Typed reads and writes over a serial SRAM.
//!
//! Values are stored big-endian (most significant byte first) for every
//! multi-byte kind; `f32` is stored as its IEEE-754 bit pattern in the same
//! order. Arrays are packed back to back and moved in a single
//! sequential-mode burst.

pub mod error;
pub mod marshaller;
pub mod scalar;

pub use error::{MarshalError, Result};
pub use marshaller::Marshaller;
pub use scalar::{decode_slice, encode_slice, Scalar};
