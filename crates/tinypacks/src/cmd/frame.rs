use tinypacks_framer::FrameWriter;

use crate::cmd::FrameArgs;
use crate::exit::{framer_error, CliResult, SUCCESS};
use crate::output::{print_bytes, OutputFormat};

pub fn run(args: FrameArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = args.input.read()?;

    // Staging buffer sized to the payload plus its CRC trailer.
    let staging = vec![0u8; payload.len() + 2];
    let mut writer = FrameWriter::new(Vec::new(), staging).with_leading_flag(args.leading_flag);
    writer
        .send(&payload)
        .map_err(|err| framer_error("frame failed", err))?;

    print_bytes(&writer.into_inner(), format);
    Ok(SUCCESS)
}
