use serde::Serialize;
use sramkit_marshal::MarshalError;
use sramkit_protocol::{DeviceConfig, Opcode, SimulatedSram, TransferMode};
use sramkit_store::{AllocatorConfig, Sram, StoreError, StreamConfig};

use crate::cmd::{Chip, DeviceArgs, SelftestArgs};
use crate::exit::{store_error, CliResult, SELFTEST_FAILED, SUCCESS};
use crate::output::{hex_address, new_table, print_json, OutputFormat};

type Device = Sram<SimulatedSram>;
type CheckFn = fn(&mut Device, &SelftestArgs) -> Result<String, String>;

const CHECKS: &[(&str, CheckFn)] = &[
    ("scalar-round-trip", scalar_round_trip),
    ("big-endian-layout", big_endian_layout),
    ("float-bit-pattern", float_bit_pattern),
    ("array-single-burst", array_single_burst),
    ("status-readback", status_readback),
    ("allocator", allocator),
    ("bounds-check", bounds_check),
    ("chunked-stream", chunked_stream),
];

#[derive(Serialize)]
struct CheckResult {
    name: &'static str,
    passed: bool,
    detail: String,
}

#[derive(Serialize)]
struct SelftestOutput {
    chip: Chip,
    capacity: u32,
    passed: bool,
    checks: Vec<CheckResult>,
}

pub fn run(args: SelftestArgs, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let config = device.config()?;

    let mut checks = Vec::with_capacity(CHECKS.len());
    for &(name, check) in CHECKS {
        let mut sram = fresh(&config, &args)?;
        let result = check(&mut sram, &args);
        tracing::debug!(check = name, ok = result.is_ok(), "selftest check");
        let (passed, detail) = match result {
            Ok(detail) => (true, detail),
            Err(detail) => (false, detail),
        };
        checks.push(CheckResult {
            name,
            passed,
            detail,
        });
    }

    let out = SelftestOutput {
        chip: device.chip,
        capacity: config.capacity,
        passed: checks.iter().all(|c| c.passed),
        checks,
    };
    print_output(&out, format);

    Ok(if out.passed { SUCCESS } else { SELFTEST_FAILED })
}

fn fresh(config: &DeviceConfig, args: &SelftestArgs) -> CliResult<Device> {
    Sram::with_config(
        SimulatedSram::from_config(config),
        config.clone(),
        AllocatorConfig::default(),
        StreamConfig {
            chunk_size: args.chunk_size,
        },
    )
    .map_err(|err| store_error("selftest setup", err))
}

fn print_output(out: &SelftestOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["CHECK", "RESULT", "DETAIL"]);
            for check in &out.checks {
                table.add_row(vec![
                    check.name.to_string(),
                    if check.passed { "ok" } else { "FAIL" }.to_string(),
                    check.detail.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for check in &out.checks {
                let mark = if check.passed { "ok" } else { "FAIL" };
                println!("[{mark:>4}] {}: {}", check.name, check.detail);
            }
            let failed = out.checks.iter().filter(|c| !c.passed).count();
            println!("{} checks, {failed} failed", out.checks.len());
        }
    }
}

fn fail(err: impl std::fmt::Display) -> String {
    err.to_string()
}

fn write_bursts(sram: &Device) -> Vec<usize> {
    sram.get_ref()
        .bursts()
        .iter()
        .filter(|b| b.first() == Some(&Opcode::Write.byte()))
        .map(|b| b.len().saturating_sub(4))
        .collect()
}

fn scalar_round_trip(sram: &mut Device, _: &SelftestArgs) -> Result<String, String> {
    let m = sram.marshaller();
    m.write_scalar(0, 0xA5u8).map_err(fail)?;
    m.write_scalar(2, -12_345i16).map_err(fail)?;
    m.write_scalar(4, 0xDEAD_BEEFu32).map_err(fail)?;
    m.write_scalar(8, i32::MIN).map_err(fail)?;

    let got = (
        m.read_scalar::<u8>(0).map_err(fail)?,
        m.read_scalar::<i16>(2).map_err(fail)?,
        m.read_scalar::<u32>(4).map_err(fail)?,
        m.read_scalar::<i32>(8).map_err(fail)?,
    );
    if got != (0xA5, -12_345, 0xDEAD_BEEF, i32::MIN) {
        return Err(format!("read back {got:?}"));
    }
    Ok("u8, i16, u32, i32 preserved".to_string())
}

fn big_endian_layout(sram: &mut Device, _: &SelftestArgs) -> Result<String, String> {
    sram.marshaller()
        .write_scalar(0x10, 0x0102_0304u32)
        .map_err(fail)?;
    let bytes = &sram.get_ref().memory()[0x10..0x14];
    if bytes != [0x01, 0x02, 0x03, 0x04] {
        return Err(format!("device holds {bytes:02X?}"));
    }
    Ok("0x01020304 stored as 01 02 03 04".to_string())
}

fn float_bit_pattern(sram: &mut Device, _: &SelftestArgs) -> Result<String, String> {
    let values = [-0.156_25f32, f32::MAX, f32::from_bits(0x7FC0_0001)];
    let m = sram.marshaller();
    m.write_array(0x20, &values).map_err(fail)?;
    let back: Vec<f32> = m.read_array(0x20, values.len()).map_err(fail)?;

    let same = values
        .iter()
        .zip(&back)
        .all(|(a, b)| a.to_bits() == b.to_bits());
    if !same {
        return Err(format!("read back {back:?}"));
    }
    Ok("IEEE-754 bits preserved, including NaN payload".to_string())
}

fn array_single_burst(sram: &mut Device, _: &SelftestArgs) -> Result<String, String> {
    let values: Vec<i16> = (-4..4).map(|v| v * 1000).collect();
    sram.get_mut().clear_bursts();
    sram.marshaller().write_array(0x40, &values).map_err(fail)?;

    let bursts = write_bursts(sram);
    if bursts != [values.len() * 2] {
        return Err(format!("write bursts carried {bursts:?} bytes"));
    }
    let back: Vec<i16> = sram
        .marshaller()
        .read_array(0x40, values.len())
        .map_err(fail)?;
    if back != values {
        return Err(format!("read back {back:?}"));
    }
    Ok(format!("{} values in one burst", values.len()))
}

fn status_readback(sram: &mut Device, _: &SelftestArgs) -> Result<String, String> {
    let encoder = sram.marshaller().encoder_mut();
    for mode in [TransferMode::Page, TransferMode::Byte, TransferMode::Sequential] {
        encoder.set_mode(mode).map_err(fail)?;
        let read = encoder.read_mode().map_err(fail)?;
        if read != mode {
            return Err(format!("set {} but read {}", mode.name(), read.name()));
        }
    }
    Ok("byte, page, sequential".to_string())
}

fn allocator(sram: &mut Device, _: &SelftestArgs) -> Result<String, String> {
    let a = sram.allocate(10).map_err(fail)?;
    let b = sram.allocate(20).map_err(fail)?;
    if b != a + 10 {
        return Err(format!("second allocation at {}", hex_address(b)));
    }

    let cursor = sram.allocator().cursor();
    let too_big = sram.allocator().remaining() as usize + 1;
    match sram.allocate(too_big) {
        Err(StoreError::OutOfSpace { .. }) if sram.allocator().cursor() == cursor => {}
        Err(err) => return Err(format!("exhaustion moved the cursor or failed oddly: {err}")),
        Ok(address) => return Err(format!("oversized request granted at {}", hex_address(address))),
    }
    Ok(format!(
        "contiguous, exhaustion leaves cursor at {}",
        hex_address(cursor)
    ))
}

fn bounds_check(sram: &mut Device, _: &SelftestArgs) -> Result<String, String> {
    let capacity = sram.config().capacity;
    sram.get_mut().clear_bursts();
    match sram.marshaller().read_scalar::<u32>(capacity.saturating_sub(2)) {
        Err(MarshalError::OutOfBounds { .. }) if sram.get_ref().bursts().is_empty() => {
            Ok("past-the-end access rejected before bus traffic".to_string())
        }
        Err(err) => Err(fail(err)),
        Ok(value) => Err(format!("read {value:#X} past the end")),
    }
}

fn chunked_stream(sram: &mut Device, args: &SelftestArgs) -> Result<String, String> {
    let data: Vec<u8> = (0..args.stream_len).map(|i| (i % 251) as u8).collect();
    sram.get_mut().clear_bursts();
    let extent = sram.write_stream(data.as_slice()).map_err(fail)?;

    if extent.len as usize != data.len() {
        return Err(format!("extent covers {} bytes", extent.len));
    }
    let chunks = write_bursts(sram);
    let expected = data.len().div_ceil(args.chunk_size);
    if chunks.len() != expected {
        return Err(format!("{} write bursts, expected {expected}", chunks.len()));
    }
    let back = sram.read_extent(extent).map_err(fail)?;
    if back != data {
        return Err("read-back mismatch".to_string());
    }
    Ok(format!(
        "{} bytes in chunks of {:?} at {}",
        data.len(),
        chunks,
        hex_address(extent.start)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SelftestArgs {
        SelftestArgs {
            stream_len: 250,
            chunk_size: 100,
        }
    }

    #[test]
    fn every_check_passes_on_both_presets() {
        for config in [DeviceConfig::mbit1(), DeviceConfig::mbit8()] {
            for &(name, check) in CHECKS {
                let mut sram = fresh(&config, &args()).unwrap();
                assert!(check(&mut sram, &args()).is_ok(), "{name} failed");
            }
        }
    }

    #[test]
    fn stream_check_reports_chunk_sizes() {
        let mut sram = fresh(&DeviceConfig::mbit1(), &args()).unwrap();
        let detail = chunked_stream(&mut sram, &args()).unwrap();
        assert!(detail.contains("[100, 100, 50]"), "{detail}");
    }

    #[test]
    fn stream_check_fails_when_device_too_small() {
        let config = DeviceConfig::new(128).unwrap();
        let mut sram = fresh(&config, &args()).unwrap();
        assert!(chunked_stream(&mut sram, &args()).is_err());
    }
}
