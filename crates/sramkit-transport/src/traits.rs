use crate::error::Result;

/// A blocking, full-duplex SPI channel with its own chip-select line.
///
/// Every `transfer` blocks until the byte has been clocked out and the reply
/// clocked in. Implementations must not buffer across `deselect`: releasing
/// chip-select ends the device's current command.
pub trait Transport {
    /// Clock one byte out and return the byte clocked in.
    fn transfer(&mut self, word: u8) -> Result<u8>;

    /// Assert chip-select (drive it low).
    fn select(&mut self) -> Result<()>;

    /// Release chip-select (drive it high).
    fn deselect(&mut self) -> Result<()>;

    /// Clock out every byte in `words`, discarding the replies.
    fn write(&mut self, words: &[u8]) -> Result<()> {
        for &word in words {
            self.transfer(word)?;
        }
        Ok(())
    }

    /// Fill `buf` with replies, clocking out `fill` for each byte.
    fn read(&mut self, buf: &mut [u8], fill: u8) -> Result<()> {
        for slot in buf.iter_mut() {
            *slot = self.transfer(fill)?;
        }
        Ok(())
    }

    /// Transport name for diagnostics.
    fn name(&self) -> &'static str {
        "spi"
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transfer(&mut self, word: u8) -> Result<u8> {
        (**self).transfer(word)
    }

    fn select(&mut self) -> Result<()> {
        (**self).select()
    }

    fn deselect(&mut self) -> Result<()> {
        (**self).deselect()
    }

    fn write(&mut self, words: &[u8]) -> Result<()> {
        (**self).write(words)
    }

    fn read(&mut self, buf: &mut [u8], fill: u8) -> Result<()> {
        (**self).read(buf, fill)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transfer(&mut self, word: u8) -> Result<u8> {
        (**self).transfer(word)
    }

    fn select(&mut self) -> Result<()> {
        (**self).select()
    }

    fn deselect(&mut self) -> Result<()> {
        (**self).deselect()
    }

    fn write(&mut self, words: &[u8]) -> Result<()> {
        (**self).write(words)
    }

    fn read(&mut self, buf: &mut [u8], fill: u8) -> Result<()> {
        (**self).read(buf, fill)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
