use std::io::Cursor;

use serde::Serialize;
use serde_json::Value;
use tinypacks_framer::{FrameReader, FramerError};
use tinypacks_pack::json::decode_all;
use tinypacks_pack::PackDecoder;
use tinypacks_postman::Response;

use crate::cmd::{ResponseArgs, MAX_LEVELS};
use crate::exit::{
    framer_error, pack_error, postman_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS,
};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct ResponseOutput {
    code: u8,
    status: &'static str,
    token: Option<i32>,
    body: Vec<Value>,
}

pub fn run(args: ResponseArgs, format: OutputFormat) -> CliResult<i32> {
    let data = args.input.read()?;
    let config = args.pack.config();

    let payload = if args.unframed {
        data
    } else {
        let capacity = data.len().max(2);
        let mut reader = FrameReader::new(Cursor::new(data), vec![0u8; capacity]);
        match reader.read_frame() {
            Ok(frame) => frame.to_vec(),
            Err(FramerError::ConnectionClosed) => {
                return Err(CliError::new(DATA_INVALID, "no valid frame in input"));
            }
            Err(err) => return Err(framer_error("read response failed", err)),
        }
    };

    let response = Response::parse(&payload, config)
        .map_err(|err| postman_error("parse response failed", err))?;
    let mut decoder = PackDecoder::<MAX_LEVELS>::with_levels(&response.body, config);
    let body = decode_all(&mut decoder).map_err(|err| pack_error("decode body failed", err))?;

    let output = ResponseOutput {
        code: response.status.code(),
        status: response.status.text(),
        token: response.token,
        body,
    };

    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(&output, false),
        OutputFormat::Pretty => print_json(&output, true),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["status".to_string(), output.status.to_string()]);
            table.add_row(vec![
                "token".to_string(),
                output
                    .token
                    .map(|token| token.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
            for (index, value) in output.body.iter().enumerate() {
                table.add_row(vec![format!("body[{index}]"), value.to_string()]);
            }
            println!("{table}");
        }
    }

    if response.status.is_success() {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}
