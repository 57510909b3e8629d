use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Adapts an `embedded-hal` SPI bus and output pin into a [`Transport`].
///
/// The bus is expected to be configured for mode 0, 8-bit words, before it
/// is handed over. Chip-select is active low.
pub struct HalTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> HalTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Take ownership of the bus and chip-select pin. Chip-select is driven
    /// high so the device starts out idle.
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self> {
        cs.set_high().map_err(cs_error)?;
        Ok(Self { spi, cs })
    }

    /// Release the bus and pin.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> Transport for HalTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    fn transfer(&mut self, word: u8) -> Result<u8> {
        let mut buf = [word];
        self.spi.transfer_in_place(&mut buf).map_err(bus_error)?;
        Ok(buf[0])
    }

    fn select(&mut self) -> Result<()> {
        trace!("chip-select low");
        self.cs.set_low().map_err(cs_error)
    }

    fn deselect(&mut self) -> Result<()> {
        // The last byte must be fully clocked out before chip-select rises.
        self.spi.flush().map_err(bus_error)?;
        trace!("chip-select high");
        self.cs.set_high().map_err(cs_error)
    }

    fn write(&mut self, words: &[u8]) -> Result<()> {
        self.spi.write(words).map_err(bus_error)
    }

    fn read(&mut self, buf: &mut [u8], fill: u8) -> Result<()> {
        buf.fill(fill);
        self.spi.transfer_in_place(buf).map_err(bus_error)
    }

    fn name(&self) -> &'static str {
        "embedded-hal"
    }
}

fn bus_error<E: embedded_hal::spi::Error>(err: E) -> TransportError {
    TransportError::Bus(format!("{:?}", err.kind()))
}

fn cs_error<E: embedded_hal::digital::Error>(err: E) -> TransportError {
    TransportError::ChipSelect(format!("{:?}", err.kind()))
}
