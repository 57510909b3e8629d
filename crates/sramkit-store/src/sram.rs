use std::io::Read;

use sramkit_marshal::{MarshalError, Marshaller, Scalar};
use sramkit_protocol::{Address, DeviceConfig};
use sramkit_transport::Transport;
use tracing::debug;

use crate::allocator::{AllocatorConfig, BumpAllocator};
use crate::error::{Result, StoreError};
use crate::extent::Extent;
use crate::stream::{ChunkWriter, StreamConfig};

/// One device, one marshaller, one allocator.
///
/// This is the usual entry point: it owns the transport, hands out address
/// ranges, and stores data into them. Every method takes `&mut self`, so a
/// host sharing the device across threads wraps the whole value in a mutex.
///
/// ```
/// use sramkit_protocol::{DeviceConfig, SimulatedSram};
/// use sramkit_store::Sram;
///
/// let config = DeviceConfig::mbit1();
/// let mut sram = Sram::new(SimulatedSram::from_config(&config), config).unwrap();
///
/// let extent = sram.store_array(&[1.5f32, -2.25]).unwrap();
/// let values: Vec<f32> = sram.marshaller().read_array(extent.start, 2).unwrap();
/// assert_eq!(values, vec![1.5, -2.25]);
/// ```
pub struct Sram<T> {
    marshaller: Marshaller<T>,
    allocator: BumpAllocator,
    writer: ChunkWriter,
}

impl<T: Transport> Sram<T> {
    /// Drive the device described by `config`, allocating from address 0.
    pub fn new(transport: T, config: DeviceConfig) -> Result<Self> {
        Self::with_config(
            transport,
            config,
            AllocatorConfig::default(),
            StreamConfig::default(),
        )
    }

    /// Full control over allocation base and stream chunking.
    pub fn with_config(
        transport: T,
        config: DeviceConfig,
        allocator: AllocatorConfig,
        stream: StreamConfig,
    ) -> Result<Self> {
        let allocator = BumpAllocator::new(config.capacity, allocator);
        let writer = ChunkWriter::new(stream)?;
        let marshaller = Marshaller::new(transport, config)?;
        debug!(
            transport = marshaller.get_ref().name(),
            capacity = allocator.capacity(),
            base = allocator.base(),
            chunk_size = writer.config().chunk_size,
            "sram ready"
        );
        Ok(Self {
            marshaller,
            allocator,
            writer,
        })
    }

    /// Reserve `size` bytes of device space.
    pub fn allocate(&mut self, size: usize) -> Result<Address> {
        self.allocator.allocate(size)
    }

    /// Copy `source` into freshly allocated space, one chunk at a time.
    pub fn write_stream<R: Read>(&mut self, source: R) -> Result<Extent> {
        self.writer
            .write(&mut self.marshaller, &mut self.allocator, source)
    }

    /// Allocate space for `values` and write them in one burst.
    pub fn store_array<S: Scalar>(&mut self, values: &[S]) -> Result<Extent> {
        let len = values
            .len()
            .checked_mul(S::WIDTH)
            .ok_or(StoreError::OutOfSpace {
                requested: usize::MAX,
                available: self.allocator.remaining(),
            })?;
        let start = self.allocator.allocate(len)?;
        self.marshaller.write_array(start, values)?;
        Ok(Extent::new(start, len as u32))
    }

    /// Allocate space for `data` and write it in one burst.
    pub fn store_bytes(&mut self, data: &[u8]) -> Result<Extent> {
        let start = self.allocator.allocate(data.len())?;
        self.marshaller.write_bytes(start, data)?;
        Ok(Extent::new(start, data.len() as u32))
    }

    /// Read back the bytes covered by `extent`.
    ///
    /// The extent is bounds-checked before the host buffer is allocated. An
    /// empty extent reads nothing and touches neither the bus nor its
    /// `start`.
    pub fn read_extent(&mut self, extent: Extent) -> Result<Vec<u8>> {
        if extent.is_empty() {
            return Ok(Vec::new());
        }
        let len = extent.len as usize;
        if !self.config().contains(extent.start, len) {
            return Err(MarshalError::OutOfBounds {
                address: extent.start,
                len,
                capacity: self.config().capacity,
            }
            .into());
        }
        let mut out = vec![0; len];
        self.marshaller.read_bytes(extent.start, &mut out)?;
        Ok(out)
    }

    /// Discard every allocation and forget the cached transfer mode.
    ///
    /// Use after the device lost power: its contents and mode are gone.
    pub fn reset(&mut self) {
        self.allocator.reset();
        self.marshaller.encoder_mut().forget_mode();
    }

    pub fn marshaller(&mut self) -> &mut Marshaller<T> {
        &mut self.marshaller
    }

    pub fn allocator(&self) -> &BumpAllocator {
        &self.allocator
    }

    pub fn config(&self) -> &DeviceConfig {
        self.marshaller.config()
    }

    pub fn stream_config(&self) -> &StreamConfig {
        self.writer.config()
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        self.marshaller.get_ref()
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        self.marshaller.get_mut()
    }

    /// Consume the driver and return the transport.
    pub fn into_inner(self) -> T {
        self.marshaller.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use sramkit_protocol::{SimulatedSram, TransferMode};

    use super::*;

    fn sram(capacity: u32) -> Sram<SimulatedSram> {
        let config = DeviceConfig::new(capacity).unwrap();
        Sram::new(SimulatedSram::from_config(&config), config).unwrap()
    }

    #[test]
    fn allocations_do_not_overlap() {
        let mut sram = sram(1024);
        let a = sram.store_array(&[1u16, 2, 3]).unwrap();
        let b = sram.store_array(&[-7i32]).unwrap();
        let c = sram.store_bytes(b"xyz").unwrap();

        assert_eq!(a, Extent::new(0, 6));
        assert_eq!(b, Extent::new(6, 4));
        assert_eq!(c, Extent::new(10, 3));
        assert_eq!(sram.allocator().cursor(), 13);

        let values: Vec<u16> = sram.marshaller().read_array(a.start, 3).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(sram.marshaller().read_scalar::<i32>(b.start).unwrap(), -7);
        assert_eq!(sram.read_extent(c).unwrap(), b"xyz");
    }

    #[test]
    fn stream_then_read_back() {
        let config = DeviceConfig::new(4096).unwrap();
        let mut sram = Sram::with_config(
            SimulatedSram::from_config(&config),
            config,
            AllocatorConfig { base: 16 },
            StreamConfig { chunk_size: 64 },
        )
        .unwrap();
        let data: Vec<u8> = (0..=255).collect();

        let extent = sram.write_stream(data.as_slice()).unwrap();
        assert_eq!(extent, Extent::new(16, 256));
        assert_eq!(sram.read_extent(extent).unwrap(), data);
        assert_eq!(sram.stream_config().chunk_size, 64);
    }

    #[test]
    fn store_array_out_of_space() {
        let mut sram = sram(8);
        sram.allocate(6).unwrap();
        let err = sram.store_array(&[0u32]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::OutOfSpace {
                requested: 4,
                available: 2
            }
        ));
        assert_eq!(sram.allocator().cursor(), 6);
    }

    #[test]
    fn raw_access_past_capacity_is_rejected() {
        let mut sram = sram(16);
        let err = sram.read_extent(Extent::new(12, 8)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Marshal(MarshalError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn oversized_extent_is_rejected_before_allocating() {
        let mut sram = sram(64);
        let err = sram.read_extent(Extent::new(0, u32::MAX)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Marshal(MarshalError::OutOfBounds {
                address: 0,
                len,
                capacity: 64,
            }) if len == u32::MAX as usize
        ));

        let err = sram.read_extent(Extent::new(u32::MAX, 1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Marshal(MarshalError::OutOfBounds { .. })
        ));
        assert!(sram.get_ref().bursts().is_empty());
    }

    #[test]
    fn empty_extent_reads_nothing() {
        let mut sram = sram(64);
        let back = sram.read_extent(Extent::empty(64)).unwrap();
        assert!(back.is_empty());
        assert!(sram.get_ref().bursts().is_empty());
    }

    #[test]
    fn reset_rewinds_and_forgets_mode() {
        let mut sram = sram(64);
        sram.store_bytes(b"abcd").unwrap();
        assert_eq!(
            sram.marshaller().encoder().cached_mode(),
            Some(TransferMode::Sequential)
        );

        sram.get_mut().power_cycle();
        sram.reset();
        assert_eq!(sram.allocator().cursor(), 0);
        assert_eq!(sram.marshaller().encoder().cached_mode(), None);

        sram.get_mut().clear_bursts();
        sram.store_bytes(b"ef").unwrap();
        // Mode is re-sent before the first burst after a reset.
        assert_eq!(sram.get_ref().bursts()[0], vec![0x01, 0x40]);
    }

    #[test]
    fn invalid_chunk_size_fails_construction() {
        let config = DeviceConfig::new(64).unwrap();
        let result = Sram::with_config(
            SimulatedSram::new(64),
            config,
            AllocatorConfig::default(),
            StreamConfig { chunk_size: 0 },
        );
        assert!(matches!(result, Err(StoreError::InvalidChunkSize)));
    }
}
