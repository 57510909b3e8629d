use std::io::{ErrorKind, Read};

use sramkit_marshal::Marshaller;
use sramkit_transport::Transport;
use tracing::{debug, info, warn};

use crate::allocator::BumpAllocator;
use crate::error::{Result, StoreError};
use crate::extent::Extent;

/// Default chunk size for streamed writes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Stream writer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Bytes buffered on the host per device write. Must be non-zero.
    pub chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Copies byte sources into freshly allocated device space.
///
/// Only one chunk is held in host memory at a time, so arbitrarily large
/// sources can be stored. The chunk buffer is reused across streams.
#[derive(Debug)]
pub struct ChunkWriter {
    config: StreamConfig,
    buf: Vec<u8>,
}

impl ChunkWriter {
    pub fn new(config: StreamConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(StoreError::InvalidChunkSize);
        }
        Ok(Self {
            buf: vec![0; config.chunk_size],
            config,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Drain `source` into the device.
    ///
    /// Each chunk is allocated right before it is written, so the chunks of
    /// one stream are contiguous. Returns the extent covering everything
    /// written; an empty source yields an empty extent at the allocator
    /// cursor.
    ///
    /// If the device fills up or the source fails, the chunks already
    /// written stay in place and the error carries their extent.
    pub fn write<T, R>(
        &mut self,
        marshaller: &mut Marshaller<T>,
        allocator: &mut BumpAllocator,
        mut source: R,
    ) -> Result<Extent>
    where
        T: Transport,
        R: Read,
    {
        let mut extent = Extent::empty(allocator.cursor());
        let mut chunks = 0usize;

        loop {
            let (filled, read_error) = fill(&mut source, &mut self.buf);
            if filled > 0 {
                let address = match allocator.allocate(filled) {
                    Ok(address) => address,
                    Err(StoreError::OutOfSpace {
                        requested,
                        available,
                    }) => {
                        warn!(
                            written = extent.len,
                            requested, available, "stream truncated, device full"
                        );
                        return Err(StoreError::CapacityExceeded {
                            written: extent,
                            requested,
                            available,
                        });
                    }
                    Err(err) => return Err(err),
                };
                marshaller.write_bytes(address, &self.buf[..filled])?;

                if extent.is_empty() {
                    extent.start = address;
                }
                // filled was just allocated, so it fits in u32.
                extent.len += filled as u32;
                chunks += 1;
                debug!(address, len = filled, chunk = chunks, "chunk written");
            }

            if let Some(err) = read_error {
                warn!(written = extent.len, error = %err, "stream source failed");
                return Err(StoreError::SourceRead {
                    written: extent,
                    source: err,
                });
            }
            if filled < self.buf.len() {
                break;
            }
        }

        info!(
            start = extent.start,
            len = extent.len,
            chunks,
            "stream stored"
        );
        Ok(extent)
    }
}

/// Stream `source` into the device in chunks of `chunk_size` bytes.
///
/// See [`ChunkWriter::write`].
pub fn write_stream<T, R>(
    marshaller: &mut Marshaller<T>,
    allocator: &mut BumpAllocator,
    source: R,
    chunk_size: usize,
) -> Result<Extent>
where
    T: Transport,
    R: Read,
{
    ChunkWriter::new(StreamConfig { chunk_size })?.write(marshaller, allocator, source)
}

/// Read until `buf` is full or the source is exhausted.
///
/// Returns the bytes filled and, if the source failed, its error. Bytes
/// read before a failure are still reported so they can be stored.
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> (usize, Option<std::io::Error>) {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return (filled, Some(err)),
        }
    }
    (filled, None)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use sramkit_protocol::{DeviceConfig, SimulatedSram};

    use super::*;
    use crate::allocator::AllocatorConfig;

    fn setup(capacity: u32) -> (Marshaller<SimulatedSram>, BumpAllocator) {
        let config = DeviceConfig::new(capacity).unwrap();
        let marshaller = Marshaller::new(SimulatedSram::from_config(&config), config).unwrap();
        let allocator = BumpAllocator::new(capacity, AllocatorConfig::default());
        (marshaller, allocator)
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// Write bursts only: opcode 0x02.
    fn write_burst_payloads(sram: &SimulatedSram) -> Vec<usize> {
        sram.bursts()
            .iter()
            .filter(|b| b.first() == Some(&0x02))
            .map(|b| b.len() - 4)
            .collect()
    }

    /// Yields `data`, then fails.
    struct Failing {
        data: Cursor<Vec<u8>>,
    }

    impl Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::other("disk gone")),
                n => Ok(n),
            }
        }
    }

    /// Yields one byte per call and interrupts every other call.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        interrupt: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let len = buf.len().min(1);
            self.data.read(&mut buf[..len])
        }
    }

    #[test]
    fn streams_in_chunks() {
        let (mut m, mut alloc) = setup(4096);
        alloc.allocate(4).unwrap();
        let data = pattern(250);

        let extent = write_stream(&mut m, &mut alloc, data.as_slice(), 100).unwrap();

        assert_eq!(extent, Extent::new(4, 250));
        assert_eq!(alloc.cursor(), 254);
        assert_eq!(write_burst_payloads(m.get_ref()), vec![100, 100, 50]);
        assert_eq!(&m.get_ref().memory()[4..254], data.as_slice());

        let mut back = vec![0u8; 250];
        m.read_bytes(extent.start, &mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn exact_multiple_of_chunk_size() {
        let (mut m, mut alloc) = setup(1024);
        let extent = write_stream(&mut m, &mut alloc, pattern(200).as_slice(), 100).unwrap();
        assert_eq!(extent, Extent::new(0, 200));
        assert_eq!(write_burst_payloads(m.get_ref()), vec![100, 100]);
    }

    #[test]
    fn empty_source_yields_empty_extent_at_cursor() {
        let (mut m, mut alloc) = setup(1024);
        alloc.allocate(7).unwrap();
        let extent = write_stream(&mut m, &mut alloc, io::empty(), 64).unwrap();
        assert!(extent.is_empty());
        assert_eq!(extent.start, 7);
        assert_eq!(alloc.cursor(), 7);
        assert!(m.get_ref().bursts().is_empty());
    }

    #[test]
    fn device_full_keeps_partial_extent() {
        let (mut m, mut alloc) = setup(256);
        let data = pattern(300);

        let err = write_stream(&mut m, &mut alloc, data.as_slice(), 100).unwrap_err();

        match err {
            StoreError::CapacityExceeded {
                written,
                requested,
                available,
            } => {
                assert_eq!(written, Extent::new(0, 200));
                assert_eq!(requested, 100);
                assert_eq!(available, 56);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(alloc.cursor(), 200);
        assert_eq!(&m.get_ref().memory()[..200], &data[..200]);
        assert!(m.get_ref().memory()[200..].iter().all(|&b| b == 0));
    }

    #[test]
    fn source_failure_is_distinct_from_capacity() {
        let (mut m, mut alloc) = setup(1024);
        let data = pattern(150);
        let source = Failing {
            data: Cursor::new(data.clone()),
        };

        let err = write_stream(&mut m, &mut alloc, source, 100).unwrap_err();

        assert_eq!(err.written(), Some(Extent::new(0, 150)));
        assert!(matches!(err, StoreError::SourceRead { .. }));
        assert_eq!(&m.get_ref().memory()[..150], data.as_slice());
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let (mut m, mut alloc) = setup(1024);
        let data = pattern(10);
        let source = Trickle {
            data: Cursor::new(data.clone()),
            interrupt: false,
        };

        let extent = write_stream(&mut m, &mut alloc, source, 4).unwrap();
        assert_eq!(extent, Extent::new(0, 10));
        assert_eq!(write_burst_payloads(m.get_ref()), vec![4, 4, 2]);
        assert_eq!(&m.get_ref().memory()[..10], data.as_slice());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let (mut m, mut alloc) = setup(64);
        let err = write_stream(&mut m, &mut alloc, &b"abc"[..], 0).unwrap_err();
        assert!(matches!(err, StoreError::InvalidChunkSize));
        assert!(m.get_ref().bursts().is_empty());
    }

    #[test]
    fn chunk_writer_reuses_buffer_across_streams() {
        let (mut m, mut alloc) = setup(1024);
        let mut writer = ChunkWriter::new(StreamConfig::default()).unwrap();
        assert_eq!(writer.config().chunk_size, DEFAULT_CHUNK_SIZE);

        let first = writer.write(&mut m, &mut alloc, &b"hello"[..]).unwrap();
        let second = writer.write(&mut m, &mut alloc, &b"world!"[..]).unwrap();
        assert_eq!(first, Extent::new(0, 5));
        assert_eq!(second, Extent::new(5, 6));
        assert_eq!(&m.get_ref().memory()[..11], b"helloworld!");
    }

    #[test]
    fn transport_fault_surfaces_as_marshal_error() {
        let (mut m, mut alloc) = setup(1024);
        m.get_mut().fail_after(0);
        let err = write_stream(&mut m, &mut alloc, pattern(10).as_slice(), 4).unwrap_err();
        assert!(matches!(err, StoreError::Marshal(_)));
    }
}
