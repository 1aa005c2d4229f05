mod cmd;
mod exit;
mod logging;
mod output;

use camlink_transport::DEFAULT_BAUD_RATE;
use clap::Parser;

use crate::cmd::{Command, Globals};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "camlink", version, about = "Serial camera link CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Serial link speed in bits per second.
    #[arg(long, env = "CAMLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    baud: u32,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let globals = Globals {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        baud_rate: cli.baud,
    };

    match cmd::run(cli.command, globals) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
