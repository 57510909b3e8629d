//! Driver for 23LCxxx-class SPI serial SRAM.
//!
//! sramkit treats an external SRAM as flat, byte-addressed storage for typed
//! data: big-endian scalars and arrays, an append-only allocator, and a
//! chunked writer for streaming large sources into the device.
//!
//! # Crate Structure
//!
//! - [`transport`]: the SPI byte transport abstraction (plus an
//!   `embedded-hal` adapter behind the `embedded-hal` feature)
//! - [`protocol`]: command framing, transfer modes, and a simulated device
//! - [`marshal`]: typed scalar and array access at absolute addresses
//! - [`store`]: bump allocation, chunked streaming, and the [`Sram`] facade
//!
//! [`Sram`]: store::Sram

/// Re-export transport types.
pub mod transport {
    pub use sramkit_transport::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use sramkit_protocol::*;
}

/// Re-export marshalling types.
pub mod marshal {
    pub use sramkit_marshal::*;
}

/// Re-export allocation and streaming types.
pub mod store {
    pub use sramkit_store::*;
}
