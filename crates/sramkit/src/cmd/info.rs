use serde::Serialize;
use sramkit_protocol::{
    DeviceConfig, ModePolicy, Opcode, TransferMode, HEADER_SIZE, MAX_CAPACITY, PAGE_SIZE,
};

use crate::cmd::{Chip, DeviceArgs, InfoArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{hex_address, hex_byte, new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct OpcodeInfo {
    name: &'static str,
    byte: u8,
    addressed: bool,
}

#[derive(Serialize)]
struct ModeInfo {
    mode: &'static str,
    status: u8,
}

#[derive(Serialize)]
struct InfoOutput {
    chip: Chip,
    capacity: u32,
    last_address: u32,
    address_bytes: usize,
    max_capacity: u32,
    page_size: u32,
    mode_policy: &'static str,
    modes: Vec<ModeInfo>,
    opcodes: Vec<OpcodeInfo>,
}

impl InfoOutput {
    fn new(chip: Chip, config: &DeviceConfig) -> Self {
        let modes = [TransferMode::Byte, TransferMode::Page, TransferMode::Sequential]
            .into_iter()
            .map(|mode| ModeInfo {
                mode: mode.name(),
                status: config.status_bits.bits(mode),
            })
            .collect();
        let opcodes = Opcode::ALL
            .into_iter()
            .map(|op| OpcodeInfo {
                name: op.name(),
                byte: op.byte(),
                addressed: op.is_addressed(),
            })
            .collect();

        Self {
            chip,
            capacity: config.capacity,
            last_address: config.capacity - 1,
            address_bytes: HEADER_SIZE - 1,
            max_capacity: MAX_CAPACITY,
            page_size: PAGE_SIZE,
            mode_policy: match config.mode_policy {
                ModePolicy::Cached => "cached",
                ModePolicy::EveryBurst => "every-burst",
            },
            modes,
            opcodes,
        }
    }
}

pub fn run(_args: InfoArgs, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let config = device.config()?;
    let out = InfoOutput::new(device.chip, &config);

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut geometry = new_table(vec!["FIELD", "VALUE"]);
            geometry
                .add_row(vec!["Chip".to_string(), format!("{:?}", out.chip)])
                .add_row(vec!["Capacity".to_string(), format!("{} bytes", out.capacity)])
                .add_row(vec!["Address range".to_string(), address_range(&out)])
                .add_row(vec!["Address frame".to_string(), format!("{} bytes", out.address_bytes)])
                .add_row(vec!["Page size".to_string(), format!("{} bytes", out.page_size)])
                .add_row(vec!["Mode policy".to_string(), out.mode_policy.to_string()]);
            println!("{geometry}");

            let mut modes = new_table(vec!["MODE", "STATUS"]);
            for mode in &out.modes {
                modes.add_row(vec![mode.mode.to_string(), hex_byte(mode.status)]);
            }
            println!("{modes}");

            let mut opcodes = new_table(vec!["OPCODE", "BYTE", "ADDRESSED"]);
            for op in &out.opcodes {
                opcodes.add_row(vec![
                    op.name.to_string(),
                    hex_byte(op.byte),
                    op.addressed.to_string(),
                ]);
            }
            println!("{opcodes}");
        }
        OutputFormat::Pretty => {
            println!("Device:");
            println!("  Chip:          {:?}", out.chip);
            println!("  Capacity:      {} bytes", out.capacity);
            println!("  Addresses:     {}", address_range(&out));
            println!("  Page size:     {} bytes", out.page_size);
            println!("  Mode policy:   {}", out.mode_policy);
            let modes = out
                .modes
                .iter()
                .map(|m| format!("{}={}", m.mode, hex_byte(m.status)))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  Status bits:   {modes}");
            let opcodes = out
                .opcodes
                .iter()
                .map(|op| format!("{} ({})", op.name, hex_byte(op.byte)))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  Opcodes:       {opcodes}");
        }
    }
    Ok(SUCCESS)
}

fn address_range(out: &InfoOutput) -> String {
    format!("{}..={}", hex_address(0u32), hex_address(out.last_address))
}
