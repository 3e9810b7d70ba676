use std::fs;
use std::io::Read;

use serde_json::Value;
use tinypacks_pack::json::encode_value;
use tinypacks_pack::PackEncoder;
use tracing::debug;

use crate::cmd::{EncodeArgs, MAX_LEVELS};
use crate::exit::{io_error, json_error, pack_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_bytes, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let value = resolve_value(&args)?;
    let values = match value {
        Value::Array(items) if args.sequence => items,
        _ if args.sequence => {
            return Err(CliError::new(USAGE, "--sequence needs a top-level JSON array"));
        }
        value => vec![value],
    };

    let mut buffer = vec![0u8; args.capacity];
    let mut encoder = PackEncoder::<MAX_LEVELS>::with_levels(&mut buffer, args.pack.config());
    for value in &values {
        encode_value(value, &mut encoder).map_err(|err| pack_error("encode failed", err))?;
    }
    debug!(elements = values.len(), bytes = encoder.offset(), "encoded");

    print_bytes(encoder.written(), format);
    Ok(SUCCESS)
}

fn resolve_value(args: &EncodeArgs) -> CliResult<Value> {
    let text = match (&args.json, &args.file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => {
            fs::read_to_string(path).map_err(|err| io_error("read input file failed", err))?
        }
        (None, None) => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| io_error("read stdin failed", err))?;
            text
        }
    };
    serde_json::from_str(&text).map_err(|err| json_error("invalid JSON input", err))
}
