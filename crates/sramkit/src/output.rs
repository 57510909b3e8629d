use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One labelled line of human-readable output.
pub type Row = (&'static str, String);

/// Print `value` as JSON, or `rows` as a table or aligned text.
pub fn print_record<T: Serialize>(value: &T, rows: &[Row], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (key, val) in rows {
                table.add_row(vec![key.to_string(), val.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
            for (key, val) in rows {
                println!("{:<width$}  {}", format!("{key}:"), val, width = width + 1);
            }
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Device addresses are shown as six hex digits, matching the 24-bit frame.
pub fn hex_address(address: impl Into<u64>) -> String {
    format!("0x{:06X}", address.into())
}

pub fn hex_byte(byte: u8) -> String {
    format!("0x{byte:02X}")
}
