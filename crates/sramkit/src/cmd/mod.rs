use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use sramkit_protocol::{Address, DeviceConfig};
use sramkit_store::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;

use crate::exit::{protocol_error, CliResult};
use crate::output::OutputFormat;

pub mod info;
pub mod load;
pub mod selftest;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream a file into the device and report its extent.
    Load(LoadArgs),
    /// Exercise typed access, allocation, and streaming against the device.
    Selftest(SelftestArgs),
    /// Show device geometry, opcodes, and status bits.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Load(args) => load::run(args, device, format),
        Command::Selftest(args) => selftest::run(args, device, format),
        Command::Info(args) => info::run(args, device, format),
        Command::Version(args) => version::run(args),
    }
}

/// Supported part families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Chip {
    /// 1 Mbit (128 KiB).
    Mbit1,
    /// 8 Mbit (1 MiB), later-revision status bits.
    Mbit8,
}

impl Chip {
    pub fn preset(self) -> DeviceConfig {
        match self {
            Chip::Mbit1 => DeviceConfig::mbit1(),
            Chip::Mbit8 => DeviceConfig::mbit8(),
        }
    }
}

/// Device selection shared by every command.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Part family.
    #[arg(long, env = "SRAMKIT_CHIP", default_value = "mbit1", global = true)]
    pub chip: Chip,
    /// Override the preset capacity in bytes.
    #[arg(long, env = "SRAMKIT_CAPACITY", value_name = "BYTES", global = true)]
    pub capacity: Option<u32>,
}

impl DeviceArgs {
    pub fn config(&self) -> CliResult<DeviceConfig> {
        let mut config = self.chip.preset();
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        config
            .validate()
            .map_err(|err| protocol_error("invalid device", err))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// File to stream into the device.
    pub file: PathBuf,
    /// Bytes per device write.
    #[arg(long, env = "SRAMKIT_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// First address to allocate from (decimal or 0x-prefixed hex).
    #[arg(long, default_value = "0", value_parser = parse_address)]
    pub base: Address,
    /// Read the data back and compare it with the file.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug)]
pub struct SelftestArgs {
    /// Bytes streamed by the chunked-write check.
    #[arg(long, default_value_t = 250)]
    pub stream_len: usize,
    /// Chunk size for the chunked-write check.
    #[arg(long, default_value_t = 100)]
    pub chunk_size: usize,
}

#[derive(Args, Debug, Default)]
pub struct InfoArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_address(value: &str) -> Result<Address, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => Address::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|err| format!("invalid address '{value}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex_addresses() {
        assert_eq!(parse_address("256"), Ok(256));
        assert_eq!(parse_address("0x100"), Ok(256));
        assert_eq!(parse_address("0XFF"), Ok(255));
        assert!(parse_address("0x").is_err());
        assert!(parse_address("-1").is_err());
    }

    #[test]
    fn capacity_override_keeps_preset_status_bits() {
        let args = DeviceArgs {
            chip: Chip::Mbit8,
            capacity: Some(4096),
        };
        let config = args.config().unwrap();
        assert_eq!(config.capacity, 4096);
        assert_eq!(config.status_bits.sequential, 0x41);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let args = DeviceArgs {
            chip: Chip::Mbit1,
            capacity: Some(0),
        };
        assert_eq!(args.config().unwrap_err().code, crate::exit::USAGE);
    }
}
