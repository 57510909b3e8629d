//! Command framing for 23LCxxx-class serial SRAM.
//!
//! Every device command is one chip-select cycle ("burst"):
//! - A 1-byte opcode
//! - A 3-byte big-endian address (read/write only)
//! - Zero or more data bytes; the device auto-increments its address
//!   counter across them according to the status-register mode
//!
//! [`CommandEncoder`] owns the transport and issues these bursts;
//! [`SimulatedSram`] is an in-memory device that answers them.

pub mod codec;
pub mod encoder;
pub mod error;
pub mod opcode;
pub mod sim;

pub use codec::{
    decode_command, encode_command, Address, DeviceConfig, ModePolicy, StatusBits, ADDRESS_MASK,
    HEADER_SIZE, MAX_CAPACITY, PAGE_SIZE,
};
pub use encoder::{CommandEncoder, DUMMY_BYTE};
pub use error::{ProtocolError, Result};
pub use opcode::{Opcode, TransferMode, MODE_MASK};
pub use sim::SimulatedSram;
