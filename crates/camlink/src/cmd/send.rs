use std::io::Write;

use camlink_device::Command;
use camlink_frame::PacketReader;
use camlink_transport::SerialLink;

use crate::cmd::{link_config, Globals, SendArgs};
use crate::exit::{command_error, frame_error, io_error, transport_error, CliResult, SUCCESS};
use crate::output::print_packet;

pub fn run(args: SendArgs, globals: Globals) -> CliResult<i32> {
    let command = Command::new(args.opcode, &args.args).map_err(command_error)?;
    if command.known_opcode().is_none() {
        tracing::warn!(opcode = args.opcode, "opcode is not in the command table");
    }

    let config = link_config(&args.port, globals.baud_rate, args.timeout);
    let mut link = SerialLink::open(&config).map_err(|err| transport_error("open failed", err))?;

    link.write_all(&command.to_bytes())
        .and_then(|()| link.flush())
        .map_err(|err| io_error("send failed", err))?;
    tracing::debug!(?command, "command sent");

    if args.wait {
        let packet = PacketReader::new(link)
            .read_packet()
            .map_err(|err| frame_error("receive failed", err))?;
        print_packet(&packet, globals.format);
    }

    Ok(SUCCESS)
}
