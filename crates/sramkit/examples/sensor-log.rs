//! Buffer a run of sensor samples in external SRAM, then read them back.
//!
//! Run with:
//!   cargo run --example sensor-log
//!
//! Uses the simulated device; swap in `transport::HalTransport` (feature
//! `embedded-hal`) to drive real hardware.

use sramkit::protocol::{DeviceConfig, SimulatedSram};
use sramkit::store::Sram;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DeviceConfig::mbit1();
    let mut sram = Sram::new(SimulatedSram::from_config(&config), config)?;

    // A header of sample count and rate, then the samples themselves.
    let samples: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).sin()).collect();
    let header = sram.store_array(&[samples.len() as u32, 1_000])?;
    let body = sram.store_array(&samples)?;
    eprintln!(
        "header at {:#08X}, {} samples at {:#08X}..{:#08X}",
        header.start,
        samples.len(),
        body.start,
        body.end()
    );

    let count: u32 = sram.marshaller().read_scalar(header.start)?;
    let back: Vec<f32> = sram.marshaller().read_array(body.start, count as usize)?;
    assert_eq!(back, samples);

    eprintln!(
        "read back {} samples, {} bytes left",
        back.len(),
        sram.allocator().remaining()
    );
    Ok(())
}
