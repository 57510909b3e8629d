use bytes::BytesMut;
use sramkit_protocol::{Address, CommandEncoder, DeviceConfig, Opcode, TransferMode};
use sramkit_transport::Transport;
use tracing::trace;

use crate::error::{MarshalError, Result};
use crate::scalar::{decode_slice, encode_slice, Scalar};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Reads and writes typed values at absolute device addresses.
///
/// Every call is exactly one burst: chip-select is asserted once, the
/// command and all data bytes are clocked, and chip-select is released
/// before the call returns. Bursts carrying more than one byte run in
/// sequential mode, which is selected first if needed.
///
/// Accesses are bounds-checked against the device capacity before any bus
/// traffic; nothing ever wraps around the end of the device.
pub struct Marshaller<T> {
    encoder: CommandEncoder<T>,
    buf: BytesMut,
}

impl<T: Transport> Marshaller<T> {
    /// Create a marshaller for a device described by `config`.
    pub fn new(transport: T, config: DeviceConfig) -> Result<Self> {
        Ok(Self::from_encoder(CommandEncoder::new(transport, config)?))
    }

    /// Wrap an existing encoder.
    pub fn from_encoder(encoder: CommandEncoder<T>) -> Self {
        Self {
            encoder,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write one value at `address`.
    pub fn write_scalar<S: Scalar>(&mut self, address: Address, value: S) -> Result<()> {
        self.buf.clear();
        value.put_be(&mut self.buf);
        self.write_buffered(address, S::WIDTH > 1)
    }

    /// Read one value from `address`.
    pub fn read_scalar<S: Scalar>(&mut self, address: Address) -> Result<S> {
        self.read_buffered(address, S::WIDTH, S::WIDTH > 1)?;
        Ok(S::get_be(&mut &self.buf[..]))
    }

    /// Write `values` back to back starting at `address`.
    pub fn write_array<S: Scalar>(&mut self, address: Address, values: &[S]) -> Result<()> {
        self.buf.clear();
        encode_slice(values, &mut self.buf);
        self.write_buffered(address, true)
    }

    /// Read `count` values starting at `address`.
    pub fn read_array<S: Scalar>(&mut self, address: Address, count: usize) -> Result<Vec<S>> {
        let len = Self::array_len::<S>(address, count, self.encoder.capacity())?;
        self.read_buffered(address, len, true)?;
        Ok(decode_slice(&self.buf))
    }

    /// Fill `out` with values read starting at `address`.
    pub fn read_array_into<S: Scalar>(&mut self, address: Address, out: &mut [S]) -> Result<()> {
        let len = Self::array_len::<S>(address, out.len(), self.encoder.capacity())?;
        self.read_buffered(address, len, true)?;
        let mut src: &[u8] = &self.buf;
        for slot in out.iter_mut() {
            *slot = S::get_be(&mut src);
        }
        Ok(())
    }

    /// Write raw bytes starting at `address`.
    pub fn write_bytes(&mut self, address: Address, data: &[u8]) -> Result<()> {
        let len = data.len();
        self.check_bounds(address, len)?;
        self.encoder.ensure_mode(TransferMode::Sequential)?;
        self.encoder
            .burst(Opcode::Write, address, |e| e.write_data(data))?;
        trace!(address, len, "write burst");
        Ok(())
    }

    /// Fill `out` with raw bytes read starting at `address`.
    pub fn read_bytes(&mut self, address: Address, out: &mut [u8]) -> Result<()> {
        let len = out.len();
        self.check_bounds(address, len)?;
        self.encoder.ensure_mode(TransferMode::Sequential)?;
        self.encoder
            .burst(Opcode::Read, address, |e| e.read_data(out))?;
        trace!(address, len, "read burst");
        Ok(())
    }

    /// Borrow the command encoder.
    pub fn encoder(&self) -> &CommandEncoder<T> {
        &self.encoder
    }

    /// Mutably borrow the command encoder (mode control, status reads).
    pub fn encoder_mut(&mut self) -> &mut CommandEncoder<T> {
        &mut self.encoder
    }

    /// Device configuration.
    pub fn config(&self) -> &DeviceConfig {
        self.encoder.config()
    }

    /// Device capacity in bytes.
    pub fn capacity(&self) -> u32 {
        self.encoder.capacity()
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        self.encoder.get_ref()
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        self.encoder.get_mut()
    }

    /// Consume the marshaller and return the transport.
    pub fn into_inner(self) -> T {
        self.encoder.into_inner()
    }

    fn write_buffered(&mut self, address: Address, sequential: bool) -> Result<()> {
        let len = self.buf.len();
        self.check_bounds(address, len)?;
        if sequential {
            self.encoder.ensure_mode(TransferMode::Sequential)?;
        }
        let Self { encoder, buf } = self;
        encoder.burst(Opcode::Write, address, |e| e.write_data(&buf[..]))?;
        trace!(address, len, "write burst");
        Ok(())
    }

    fn read_buffered(&mut self, address: Address, len: usize, sequential: bool) -> Result<()> {
        self.check_bounds(address, len)?;
        if sequential {
            self.encoder.ensure_mode(TransferMode::Sequential)?;
        }
        self.buf.clear();
        self.buf.resize(len, 0);
        let Self { encoder, buf } = self;
        encoder.burst(Opcode::Read, address, |e| e.read_data(&mut buf[..]))?;
        trace!(address, len, "read burst");
        Ok(())
    }

    fn check_bounds(&self, address: Address, len: usize) -> Result<()> {
        if self.encoder.config().contains(address, len) {
            Ok(())
        } else {
            Err(MarshalError::OutOfBounds {
                address,
                len,
                capacity: self.encoder.capacity(),
            })
        }
    }

    fn array_len<S: Scalar>(address: Address, count: usize, capacity: u32) -> Result<usize> {
        count
            .checked_mul(S::WIDTH)
            .ok_or(MarshalError::OutOfBounds {
                address,
                len: usize::MAX,
                capacity,
            })
    }
}
