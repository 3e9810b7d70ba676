use serde_json::Value;
use tinypacks_pack::json::{decode_all, decode_value};
use tinypacks_pack::{PackDecoder, PackError};
use tracing::warn;

use crate::cmd::{DecodeArgs, MAX_LEVELS};
use crate::exit::{pack_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, spaced_hex, OutputFormat};

type Decoder<'a> = PackDecoder<'a, MAX_LEVELS>;

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let data = args.input.read()?;
    let mut decoder = Decoder::with_levels(&data, args.pack.config());

    match format {
        OutputFormat::Table => print_listing(&mut decoder)?,
        OutputFormat::Json | OutputFormat::Pretty | OutputFormat::Raw => {
            let values =
                decode_all(&mut decoder).map_err(|err| pack_error("decode failed", err))?;
            match format {
                OutputFormat::Raw => {
                    for value in &values {
                        println!("{value}");
                    }
                }
                _ => print_json(&values, matches!(format, OutputFormat::Pretty)),
            }
        }
    }

    let consumed = decoder.element_offset() + decoder.element_len();
    if consumed < data.len() {
        warn!(
            consumed,
            trailing = data.len() - consumed,
            "input has bytes that do not form an element"
        );
    }
    Ok(SUCCESS)
}

/// One row per element, containers followed by their children.
fn print_listing(decoder: &mut Decoder<'_>) -> CliResult<()> {
    let mut table = new_table(vec!["OFFSET", "DEPTH", "TYPE", "LENGTH", "VALUE"]);

    loop {
        if !decoder.advance() {
            if decoder.depth() == 0 {
                break;
            }
            decoder.exit().map_err(|err| pack_error("decode failed", err))?;
            continue;
        }

        let element_type = decoder.element_type().map(|t| t.name()).unwrap_or("?");
        let value = if decoder.is_container() {
            String::new()
        } else {
            render_scalar(decoder)?
        };
        table.add_row(vec![
            format!("{:04X}", decoder.element_offset()),
            decoder.depth().to_string(),
            element_type.to_string(),
            decoder.content_len().to_string(),
            value,
        ]);

        if decoder.is_container() && decoder.content_len() > 0 {
            match decoder.enter() {
                Ok(()) => {}
                Err(PackError::DepthExceeded { max }) => {
                    warn!(
                        offset = decoder.element_offset(),
                        max,
                        "nesting too deep, not listing children"
                    );
                }
                Err(err) => return Err(pack_error("decode failed", err)),
            }
        }
    }

    println!("{table}");
    Ok(())
}

fn render_scalar(decoder: &mut Decoder<'_>) -> CliResult<String> {
    if decoder.is_bytes() {
        return Ok(spaced_hex(decoder.content()));
    }
    let value = decode_value(decoder).map_err(|err| pack_error("decode failed", err))?;
    Ok(match value {
        Value::String(text) => text,
        other => other.to_string(),
    })
}
