use serde_json::Value;
use tinypacks_framer::FrameWriter;
use tinypacks_pack::json::encode_value;
use tinypacks_pack::PackEncoder;
use tinypacks_postman::{write_request, Method};
use tracing::debug;

use crate::cmd::{MethodArg, RequestArgs, DEFAULT_CAPACITY, MAX_LEVELS};
use crate::exit::{
    framer_error, json_error, pack_error, postman_error, CliError, CliResult, SUCCESS, USAGE,
};
use crate::output::{print_bytes, OutputFormat};

impl From<MethodArg> for Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Get => Method::Get,
            MethodArg::Post => Method::Post,
            MethodArg::Put => Method::Put,
            MethodArg::Delete => Method::Delete,
        }
    }
}

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.pack.config();

    let mut body = vec![0u8; DEFAULT_CAPACITY];
    let body_len = match &args.body {
        Some(text) => {
            let value = serde_json::from_str::<Value>(text)
                .map_err(|err| json_error("invalid --body", err))?;
            let Value::Array(items) = value else {
                return Err(CliError::new(USAGE, "--body must be a JSON array"));
            };
            let mut encoder = PackEncoder::<MAX_LEVELS>::with_levels(&mut body, config);
            for item in &items {
                encode_value(item, &mut encoder)
                    .map_err(|err| pack_error("encode body failed", err))?;
            }
            encoder.offset()
        }
        None => 0,
    };

    let method = Method::from(args.method);
    let mut payload = vec![0u8; DEFAULT_CAPACITY + body_len];
    let payload_len = {
        let mut encoder = PackEncoder::with_config(&mut payload, config);
        write_request(&mut encoder, method, args.token, &args.path, &body[..body_len])
            .map_err(|err| postman_error("build request failed", err))?;
        encoder.offset()
    };
    let payload = &payload[..payload_len];
    debug!(%method, path = %args.path, token = args.token, len = payload_len, "request built");

    if args.unframed {
        print_bytes(payload, format);
        return Ok(SUCCESS);
    }

    let mut writer =
        FrameWriter::new(Vec::new(), vec![0u8; payload_len + 2]).with_leading_flag(true);
    writer
        .send(payload)
        .map_err(|err| framer_error("frame failed", err))?;
    print_bytes(&writer.into_inner(), format);
    Ok(SUCCESS)
}
