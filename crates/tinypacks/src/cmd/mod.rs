use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use tinypacks_pack::{FormatWidth, PackConfig};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod deframe;
pub mod encode;
pub mod frame;
pub mod request;
pub mod response;
pub mod version;

/// Scratch buffer size used when no `--capacity` is given.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Container nesting the host tools accept. Devices usually run with less.
pub const MAX_LEVELS: usize = 16;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode JSON values as a pack.
    Encode(EncodeArgs),
    /// Decode a pack and print its elements.
    Decode(DecodeArgs),
    /// Wrap a payload in a CRC-checked frame.
    Frame(FrameArgs),
    /// Extract every valid frame from a byte stream.
    Deframe(DeframeArgs),
    /// Build a request for a device.
    Request(RequestArgs),
    /// Parse a device response.
    Response(ResponseArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Frame(args) => frame::run(args, format),
        Command::Deframe(args) => deframe::run(args, format),
        Command::Request(args) => request::run(args, format),
        Command::Response(args) => response::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Width {
    Small,
    Medium,
    Big,
}

impl From<Width> for FormatWidth {
    fn from(width: Width) -> Self {
        match width {
            Width::Small => FormatWidth::Small,
            Width::Medium => FormatWidth::Medium,
            Width::Big => FormatWidth::Big,
        }
    }
}

/// Format options shared by every command that reads or writes packs.
#[derive(Args, Debug)]
pub struct PackArgs {
    /// Length extensions in use on the link.
    #[arg(long, value_enum, default_value = "medium")]
    pub width: Width,
    /// Encode reals as 8-byte doubles instead of 4-byte floats.
    #[arg(long)]
    pub wide_reals: bool,
}

impl PackArgs {
    pub fn config(&self) -> PackConfig {
        PackConfig::new(self.width.into()).with_wide_reals(self.wide_reals)
    }
}

/// Binary input: `--hex` text, a file, or stdin.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Input bytes as hex (whitespace is ignored).
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read input bytes from a file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    pub fn read(&self) -> CliResult<Vec<u8>> {
        if let Some(text) = &self.hex {
            return parse_hex(text);
        }
        if let Some(path) = &self.file {
            return fs::read(path).map_err(|err| io_error("read input file failed", err));
        }
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .map_err(|err| io_error("read stdin failed", err))?;
        Ok(data)
    }
}

pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON value to encode.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the JSON value from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Treat a top-level JSON array as a sequence of top-level elements.
    #[arg(long)]
    pub sequence: bool,
    /// Size of the output buffer in bytes.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
    #[command(flatten)]
    pub pack: PackArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub pack: PackArgs,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Send a flag byte before the frame as well.
    #[arg(long)]
    pub leading_flag: bool,
}

#[derive(Args, Debug)]
pub struct DeframeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Receive buffer size; longer frames are dropped.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum MethodArg {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Request method.
    #[arg(value_enum)]
    pub method: MethodArg,
    /// Resource path (empty for the index).
    pub path: String,
    /// Token echoed back by the device.
    #[arg(long, default_value_t = 0)]
    pub token: i32,
    /// Body elements as a JSON array, one element per item.
    #[arg(long)]
    pub body: Option<String>,
    /// Print the bare payload without framing.
    #[arg(long)]
    pub unframed: bool,
    #[command(flatten)]
    pub pack: PackArgs,
}

#[derive(Args, Debug)]
pub struct ResponseArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Input is a bare payload rather than a frame.
    #[arg(long)]
    pub unframed: bool,
    #[command(flatten)]
    pub pack: PackArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Print build details.
    #[arg(long)]
    pub extended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_ignores_whitespace() {
        assert_eq!(parse_hex("41 FB\n42 00 c8").unwrap(), [0x41, 0xFB, 0x42, 0x00, 0xC8]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn bad_hex_is_a_usage_error() {
        assert_eq!(parse_hex("4").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("zz").unwrap_err().code, USAGE);
    }

    #[test]
    fn pack_args_build_config() {
        let args = PackArgs {
            width: Width::Small,
            wide_reals: true,
        };
        assert_eq!(args.config(), PackConfig::new(FormatWidth::Small).with_wide_reals(true));
    }
}
