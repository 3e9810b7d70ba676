use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Bytes per row in table output.
const ROW_WIDTH: usize = 16;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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

#[derive(Serialize)]
struct BytesOutput {
    length: usize,
    hex: String,
}

/// Print an encoded byte string: binary for `raw`, hex otherwise.
pub fn print_bytes(bytes: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(
            &BytesOutput {
                length: bytes.len(),
                hex: hex::encode(bytes),
            },
            false,
        ),
        OutputFormat::Table => {
            let mut table = new_table(vec!["OFFSET", "BYTES"]);
            for (row, chunk) in bytes.chunks(ROW_WIDTH).enumerate() {
                table.add_row(vec![
                    format!("{:04X}", row * ROW_WIDTH),
                    spaced_hex(chunk),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{} ({} bytes)", spaced_hex(bytes), bytes.len()),
        OutputFormat::Raw => print_raw(bytes),
    }
}

pub fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    println!("{}", text.unwrap_or_else(|_| "{}".to_string()));
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Uppercase hex with a space between bytes, e.g. `41 FB`.
pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaced_hex_formatting() {
        assert_eq!(spaced_hex(&[]), "");
        assert_eq!(spaced_hex(&[0x41, 0xFB, 0x07]), "41 FB 07");
    }
}
