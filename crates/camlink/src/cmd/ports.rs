use camlink_transport::list_ports;

use crate::cmd::PortsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = list_ports();
    if ports.is_empty() {
        tracing::info!("no serial ports found");
    }
    print_ports(&ports, format);
    Ok(SUCCESS)
}
