//! SPI transport abstraction for serial SRAM devices.
//!
//! A transport is a duplex byte channel plus a chip-select line:
//! - `transfer` clocks one byte out and returns the byte clocked in
//! - `select` / `deselect` drive chip-select low / high
//!
//! This is the lowest layer of sramkit. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod error;
pub mod traits;

#[cfg(feature = "embedded-hal")]
pub mod hal;

pub use error::{Result, TransportError};
pub use traits::Transport;

#[cfg(feature = "embedded-hal")]
pub use hal::HalTransport;
