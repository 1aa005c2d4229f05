use std::path::PathBuf;
use std::time::Duration;

use camlink_device::{Opcode, PixelFormat, Resolution};
use camlink_transport::LinkConfig;
use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod capture;
pub mod decode;
pub mod emulate;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulated camera module on a serial port.
    Emulate(EmulateArgs),
    /// Send one raw command and optionally print the reply.
    Send(SendArgs),
    /// Take a picture and save the image body to a file.
    Capture(CaptureArgs),
    /// Decode packets from a captured byte dump.
    Decode(DecodeArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Globals {
    pub format: OutputFormat,
    pub baud_rate: u32,
}

pub fn run(command: Command, globals: Globals) -> CliResult<i32> {
    match command {
        Command::Emulate(args) => emulate::run(args, globals),
        Command::Send(args) => send::run(args, globals),
        Command::Capture(args) => capture::run(args, globals),
        Command::Decode(args) => decode::run(args, globals.format),
        Command::Ports(args) => ports::run(args, globals.format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EmulateArgs {
    /// Serial port to serve on.
    pub port: String,
    /// Pretend a preview consumer is registered.
    #[arg(long)]
    pub callback: bool,
    /// Fixed size of every captured frame in bytes.
    #[arg(long, value_name = "BYTES")]
    pub frame_len: Option<usize>,
    /// Largest resolution the simulated camera accepts.
    #[arg(long, value_name = "RES", value_parser = parse_resolution)]
    pub max_resolution: Option<Resolution>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial port the camera is on.
    pub port: String,
    /// Opcode name (e.g. GET_SDK_VER_INFO) or number (e.g. 0x40).
    #[arg(value_parser = parse_opcode)]
    pub opcode: u8,
    /// Argument bytes, decimal or 0x-prefixed hex.
    #[arg(value_parser = parse_byte)]
    pub args: Vec<u8>,
    /// Wait for one reply packet and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub timeout: Duration,
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Serial port the camera is on.
    pub port: String,
    /// Resolution name (e.g. VGA) or number.
    #[arg(long, short = 'r', default_value = "QVGA", value_parser = parse_resolution)]
    pub resolution: Resolution,
    /// Pixel format name (JPEG, RGB565, YUV) or number.
    #[arg(long = "pixel-format", short = 'p', default_value = "JPEG", value_parser = parse_pixel_format)]
    pub pixel_format: PixelFormat,
    /// File to write the image body to.
    #[arg(long, short = 'o')]
    pub output: PathBuf,
    /// Maximum time to wait for the image (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding raw bytes received from a camera.
    pub file: PathBuf,
    /// Image packets carry no descriptor byte.
    #[arg(long)]
    pub no_descriptor: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn link_config(port: &str, baud_rate: u32, read_timeout: Duration) -> LinkConfig {
    LinkConfig::new(port)
        .with_baud_rate(baud_rate)
        .with_read_timeout(read_timeout)
}

pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("not a byte value: {input}"))
}

pub fn parse_opcode(input: &str) -> Result<u8, String> {
    if let Some(op) = Opcode::from_name(input.trim()) {
        return Ok(op.as_byte());
    }
    parse_byte(input).map_err(|_| format!("unknown opcode: {input}"))
}

pub fn parse_resolution(input: &str) -> Result<Resolution, String> {
    Resolution::from_name(input.trim())
        .or_else(|| parse_byte(input).ok().map(Resolution))
        .ok_or_else(|| format!("unknown resolution: {input}"))
}

pub fn parse_pixel_format(input: &str) -> Result<PixelFormat, String> {
    PixelFormat::from_name(input.trim())
        .or_else(|| parse_byte(input).ok().map(PixelFormat))
        .ok_or_else(|| format!("unknown pixel format: {input}"))
}

pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

pub fn install_ctrlc_handler(
    running: std::sync::Arc<std::sync::atomic::AtomicBool>,
) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, std::sync::atomic::Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
