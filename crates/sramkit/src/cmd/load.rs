use std::fs::File;
use std::io::BufReader;

use serde::Serialize;
use sramkit_protocol::SimulatedSram;
use sramkit_store::{AllocatorConfig, Extent, Sram, StoreError, StreamConfig};

use crate::cmd::{Chip, DeviceArgs, LoadArgs};
use crate::exit::{io_error, store_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{hex_address, print_record, OutputFormat, Row};

#[derive(Serialize)]
struct LoadOutput {
    file: String,
    chip: Chip,
    capacity: u32,
    start: u32,
    len: u32,
    end: u64,
    chunk_size: usize,
    chunks: usize,
    remaining: u32,
    truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
}

impl LoadOutput {
    fn rows(&self) -> Vec<Row> {
        let mut rows = vec![
            ("File", self.file.clone()),
            ("Chip", format!("{:?} ({} bytes)", self.chip, self.capacity)),
            ("Start", hex_address(self.start)),
            ("Length", self.len.to_string()),
            ("End", hex_address(self.end)),
            (
                "Chunks",
                format!("{} x {} bytes", self.chunks, self.chunk_size),
            ),
            ("Remaining", self.remaining.to_string()),
            ("Truncated", self.truncated.to_string()),
        ];
        if let Some(verified) = self.verified {
            rows.push(("Verified", verified.to_string()));
        }
        rows
    }
}

pub fn run(args: LoadArgs, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let config = device.config()?;
    if args.base >= config.capacity {
        return Err(CliError::new(
            USAGE,
            format!(
                "base {} is outside the device ({} bytes)",
                hex_address(args.base),
                config.capacity
            ),
        ));
    }

    let path = args.file.display().to_string();
    let file = File::open(&args.file).map_err(|err| io_error(&format!("open {path}"), err))?;

    let mut sram = Sram::with_config(
        SimulatedSram::from_config(&config),
        config,
        AllocatorConfig { base: args.base },
        StreamConfig {
            chunk_size: args.chunk_size,
        },
    )
    .map_err(|err| store_error("setup", err))?;

    tracing::info!(file = %path, chunk_size = args.chunk_size, "loading");
    let (extent, failure) = match sram.write_stream(BufReader::new(file)) {
        Ok(extent) => (extent, None),
        // A full device still leaves a valid prefix worth reporting.
        Err(err) => match err.written() {
            Some(written) if matches!(err, StoreError::CapacityExceeded { .. }) => {
                (written, Some(err))
            }
            _ => return Err(store_error("load", err)),
        },
    };

    let verified = match (args.verify, &failure) {
        (true, None) => Some(verify(&mut sram, extent, &args)?),
        _ => None,
    };

    let out = LoadOutput {
        file: path,
        chip: device.chip,
        capacity: sram.config().capacity,
        start: extent.start,
        len: extent.len,
        end: extent.end(),
        chunk_size: args.chunk_size,
        chunks: (extent.len as usize).div_ceil(args.chunk_size),
        remaining: sram.allocator().remaining(),
        truncated: failure.is_some(),
        verified,
    };
    print_record(&out, &out.rows(), format);

    if let Some(err) = failure {
        return Err(store_error("load", err));
    }
    if verified == Some(false) {
        return Err(CliError::new(DATA_INVALID, "verify failed: device contents differ"));
    }
    Ok(SUCCESS)
}

fn verify(sram: &mut Sram<SimulatedSram>, extent: Extent, args: &LoadArgs) -> CliResult<bool> {
    let expected = std::fs::read(&args.file)
        .map_err(|err| io_error(&format!("re-read {}", args.file.display()), err))?;
    let actual = sram
        .read_extent(extent)
        .map_err(|err| store_error("verify", err))?;

    match expected.iter().zip(&actual).position(|(a, b)| a != b) {
        Some(offset) => {
            tracing::warn!(offset, "verify mismatch");
            Ok(false)
        }
        None => Ok(expected.len() == actual.len()),
    }
}
