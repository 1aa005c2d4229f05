use std::fs;
use std::io::Write;

use camlink_device::Command;
use camlink_frame::{image_descriptor, PacketReader};
use camlink_transport::{SerialLink, Transport};

use crate::cmd::{link_config, CaptureArgs, Globals};
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_capture, CaptureOutput};

pub fn run(args: CaptureArgs, globals: Globals) -> CliResult<i32> {
    let config = link_config(&args.port, globals.baud_rate, args.timeout);
    let mut link = SerialLink::open(&config).map_err(|err| transport_error("open failed", err))?;
    link.discard_input()
        .map_err(|err| transport_error("flush failed", err))?;

    let mut request = Command::set_picture_resolution(args.resolution, args.pixel_format).to_bytes();
    request.extend(Command::take_picture().to_bytes());
    link.write_all(&request)
        .and_then(|()| link.flush())
        .map_err(|err| io_error("send failed", err))?;

    let image = PacketReader::new(link)
        .read_image()
        .map_err(|err| frame_error("receive failed", err))?;

    let expected = image_descriptor(args.resolution.0);
    if image.descriptor != Some(expected) {
        tracing::warn!(
            expected,
            found = ?image.descriptor,
            "image descriptor does not match the requested resolution"
        );
    }
    if image.payload.is_empty() {
        return Err(CliError::new(DATA_INVALID, "camera returned an empty image"));
    }

    fs::write(&args.output, &image.payload).map_err(|err| {
        io_error(&format!("failed writing {}", args.output.display()), err)
    })?;

    let path = args.output.display().to_string();
    print_capture(
        &CaptureOutput {
            path: &path,
            resolution: args.resolution.name(),
            pixel_format: args.pixel_format.name(),
            descriptor: image.descriptor,
            bytes: image.payload.len(),
        },
        globals.format,
    );
    Ok(SUCCESS)
}
