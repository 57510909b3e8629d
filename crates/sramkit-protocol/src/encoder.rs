use bytes::BytesMut;
use sramkit_transport::Transport;
use tracing::{debug, trace};

use crate::codec::{encode_command, Address, DeviceConfig, ModePolicy, HEADER_SIZE};
use crate::error::{ProtocolError, Result};
use crate::opcode::{Opcode, TransferMode};

/// Byte clocked out while reading data or status.
pub const DUMMY_BYTE: u8 = 0x00;

/// Issues device commands over an owned [`Transport`].
///
/// The encoder is the only owner of the transport and the chip-select line,
/// so one command burst is in flight at a time by construction.
pub struct CommandEncoder<T> {
    inner: T,
    config: DeviceConfig,
    mode: Option<TransferMode>,
    buf: BytesMut,
}

impl<T: Transport> CommandEncoder<T> {
    /// Create an encoder for a device described by `config`.
    ///
    /// The device mode is unknown until it is first set or read back.
    pub fn new(inner: T, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            config,
            mode: None,
            buf: BytesMut::with_capacity(HEADER_SIZE),
        })
    }

    /// Assert chip-select and send `op` followed by the 3-byte address.
    ///
    /// Chip-select stays asserted so the caller can clock the data phase;
    /// finish with [`end_command`](Self::end_command). If the header cannot
    /// be sent, chip-select is released before the error is returned.
    pub fn send_command(&mut self, op: Opcode, address: Address) -> Result<()> {
        self.buf.clear();
        encode_command(op, address, &mut self.buf);
        trace!(opcode = op.name(), address, "command");

        self.inner.select()?;
        if let Err(err) = self.inner.write(&self.buf) {
            let _ = self.inner.deselect();
            return Err(err.into());
        }
        Ok(())
    }

    /// Release chip-select, ending the current burst.
    pub fn end_command(&mut self) -> Result<()> {
        self.inner.deselect()?;
        Ok(())
    }

    /// Run one complete burst: command, data phase `f`, chip-select release.
    ///
    /// Chip-select is released even if `f` fails; the first error wins.
    pub fn burst<R>(
        &mut self,
        op: Opcode,
        address: Address,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.send_command(op, address)?;
        let result = f(self);
        let end = self.end_command();
        let value = result?;
        end?;
        Ok(value)
    }

    /// Clock out data bytes inside a burst.
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write(data)?;
        Ok(())
    }

    /// Clock in data bytes inside a burst.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read(buf, DUMMY_BYTE)?;
        Ok(())
    }

    /// Write the status register to select `mode`.
    ///
    /// Always issues the command; the device treats repeats as no-ops.
    pub fn set_mode(&mut self, mode: TransferMode) -> Result<()> {
        let bits = self.config.status_bits.bits(mode);
        self.short_command(&[Opcode::WriteStatus.byte(), bits])?;
        debug!(mode = mode.name(), status = bits, "transfer mode set");
        self.mode = Some(mode);
        Ok(())
    }

    /// Select `mode` unless it is already known to be active.
    pub fn ensure_mode(&mut self, mode: TransferMode) -> Result<()> {
        if self.config.mode_policy == ModePolicy::Cached && self.mode == Some(mode) {
            return Ok(());
        }
        self.set_mode(mode)
    }

    /// Read the raw status register.
    pub fn read_status(&mut self) -> Result<u8> {
        let status = self.short_command(&[Opcode::ReadStatus.byte(), DUMMY_BYTE])?;
        trace!(status, "status read");
        Ok(status)
    }

    /// Read the status register and decode the active transfer mode.
    pub fn read_mode(&mut self) -> Result<TransferMode> {
        let status = self.read_status()?;
        let mode = TransferMode::from_status(status).ok_or(ProtocolError::UnexpectedStatus(status))?;
        self.mode = Some(mode);
        Ok(mode)
    }

    /// Return the device to plain SPI I/O and forget the cached mode.
    pub fn reset_io(&mut self) -> Result<()> {
        self.short_command(&[Opcode::ResetIo.byte()])?;
        self.mode = None;
        debug!("device i/o reset");
        Ok(())
    }

    /// The last mode set or read back, if any.
    pub fn cached_mode(&self) -> Option<TransferMode> {
        self.mode
    }

    /// Forget the cached mode, e.g. after the device lost power.
    pub fn forget_mode(&mut self) {
        self.mode = None;
    }

    /// Device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Device capacity in bytes.
    pub fn capacity(&self) -> u32 {
        self.config.capacity
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the encoder and return the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// One self-contained burst; returns the reply to the last byte.
    fn short_command(&mut self, bytes: &[u8]) -> Result<u8> {
        self.inner.select()?;
        let mut reply = Ok(0);
        for &byte in bytes {
            reply = self.inner.transfer(byte);
            if reply.is_err() {
                break;
            }
        }
        let end = self.inner.deselect();
        let reply = reply?;
        end?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use sramkit_transport::TransportError;

    use super::*;
    use crate::sim::SimulatedSram;

    fn encoder() -> CommandEncoder<SimulatedSram> {
        let config = DeviceConfig::new(1024).unwrap();
        CommandEncoder::new(SimulatedSram::new(1024), config).unwrap()
    }

    #[test]
    fn send_command_frames_opcode_and_address() {
        let mut enc = encoder();
        enc.send_command(Opcode::Write, 0x0203).unwrap();
        enc.write_data(&[0xAA]).unwrap();
        enc.end_command().unwrap();

        let bursts = enc.get_ref().bursts();
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0], vec![0x02, 0x00, 0x02, 0x03, 0xAA]);
        assert_eq!(enc.get_ref().memory()[0x203], 0xAA);
    }

    #[test]
    fn send_command_leaves_chip_select_asserted() {
        let mut enc = encoder();
        enc.send_command(Opcode::Read, 0).unwrap();
        assert!(enc.get_ref().is_selected());
        enc.end_command().unwrap();
        assert!(!enc.get_ref().is_selected());
    }

    #[test]
    fn burst_round_trips_data() {
        let mut enc = encoder();
        enc.set_mode(TransferMode::Sequential).unwrap();
        enc.burst(Opcode::Write, 10, |e| e.write_data(&[1, 2, 3]))
            .unwrap();

        let mut buf = [0u8; 3];
        enc.burst(Opcode::Read, 10, |e| e.read_data(&mut buf))
            .unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn burst_releases_chip_select_on_error() {
        let mut enc = encoder();
        let err = enc
            .burst(Opcode::Write, 0, |_| -> Result<()> {
                Err(ProtocolError::UnexpectedStatus(0xC0))
            })
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedStatus(0xC0)));
        assert!(!enc.get_ref().is_selected());
    }

    #[test]
    fn set_mode_writes_status_register() {
        let mut enc = encoder();
        enc.set_mode(TransferMode::Page).unwrap();
        assert_eq!(enc.get_ref().bursts().last().unwrap(), &vec![0x01, 0x80]);
        assert_eq!(enc.read_status().unwrap(), 0x80);
        assert_eq!(enc.read_mode().unwrap(), TransferMode::Page);
    }

    #[test]
    fn ensure_mode_skips_redundant_writes() {
        let mut enc = encoder();
        enc.ensure_mode(TransferMode::Sequential).unwrap();
        enc.ensure_mode(TransferMode::Sequential).unwrap();
        assert_eq!(enc.get_ref().bursts().len(), 1);

        enc.ensure_mode(TransferMode::Byte).unwrap();
        assert_eq!(enc.get_ref().bursts().len(), 2);
        assert_eq!(enc.cached_mode(), Some(TransferMode::Byte));
    }

    #[test]
    fn every_burst_policy_always_writes() {
        let config = DeviceConfig {
            mode_policy: ModePolicy::EveryBurst,
            ..DeviceConfig::new(64).unwrap()
        };
        let mut enc = CommandEncoder::new(SimulatedSram::new(64), config).unwrap();
        enc.ensure_mode(TransferMode::Sequential).unwrap();
        enc.ensure_mode(TransferMode::Sequential).unwrap();
        assert_eq!(enc.get_ref().bursts().len(), 2);
    }

    #[test]
    fn read_mode_rejects_reserved_pattern() {
        let mut enc = CommandEncoder::new(
            SimulatedSram::new(64).with_status(0xC0),
            DeviceConfig::new(64).unwrap(),
        )
        .unwrap();
        let err = enc.read_mode().unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedStatus(0xC0)));
    }

    #[test]
    fn reset_io_forgets_mode() {
        let mut enc = encoder();
        enc.set_mode(TransferMode::Sequential).unwrap();
        enc.reset_io().unwrap();
        assert_eq!(enc.cached_mode(), None);
        assert_eq!(enc.get_ref().bursts().last().unwrap(), &vec![0xFF]);
    }

    #[test]
    fn transport_fault_propagates_and_releases_select() {
        let mut enc = encoder();
        enc.get_mut().fail_after(2);
        let err = enc.send_command(Opcode::Write, 0).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Transport(TransportError::Bus(_))
        ));
        assert!(!enc.get_ref().is_selected());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = DeviceConfig {
            capacity: 0,
            ..DeviceConfig::default()
        };
        let result = CommandEncoder::new(SimulatedSram::new(16), config);
        assert!(matches!(result, Err(ProtocolError::InvalidCapacity { .. })));
    }
}
