use std::io::Cursor;

use serde::Serialize;
use tinypacks_framer::{FrameReader, FramerError};
use tracing::{debug, info};

use crate::cmd::DeframeArgs;
use crate::exit::{framer_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{new_table, print_json, print_raw, spaced_hex, OutputFormat};

#[derive(Serialize)]
struct FrameOutput {
    index: usize,
    length: usize,
    hex: String,
}

pub fn run(args: DeframeArgs, format: OutputFormat) -> CliResult<i32> {
    let data = args.input.read()?;
    let mut reader = FrameReader::new(Cursor::new(data), vec![0u8; args.capacity]);

    let mut frames = Vec::new();
    loop {
        match reader.read_frame() {
            Ok(payload) => {
                debug!(index = frames.len(), len = payload.len(), "frame received");
                frames.push(payload);
            }
            Err(FramerError::ConnectionClosed) => break,
            Err(err) => return Err(framer_error("deframe failed", err)),
        }
    }
    info!(frames = frames.len(), "input exhausted");

    if frames.is_empty() {
        return Err(CliError::new(DATA_INVALID, "no valid frames in input"));
    }

    match format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let output: Vec<FrameOutput> = frames
                .iter()
                .enumerate()
                .map(|(index, payload)| FrameOutput {
                    index,
                    length: payload.len(),
                    hex: hex::encode(payload),
                })
                .collect();
            print_json(&output, matches!(format, OutputFormat::Pretty));
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "LENGTH", "PAYLOAD"]);
            for (index, payload) in frames.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    payload.len().to_string(),
                    spaced_hex(payload),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Raw => {
            for payload in &frames {
                print_raw(payload);
            }
        }
    }
    Ok(SUCCESS)
}
