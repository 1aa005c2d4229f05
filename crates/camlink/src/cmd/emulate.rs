use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use camlink_device::{Device, SimulatedCamera};
use camlink_transport::{SerialLink, DEFAULT_READ_TIMEOUT};

use crate::cmd::{install_ctrlc_handler, link_config, EmulateArgs, Globals};
use crate::exit::{device_error, transport_error, CliResult, SUCCESS};

pub fn run(args: EmulateArgs, globals: Globals) -> CliResult<i32> {
    let config = link_config(&args.port, globals.baud_rate, DEFAULT_READ_TIMEOUT);
    let link = SerialLink::open(&config).map_err(|err| transport_error("open failed", err))?;

    let mut camera = SimulatedCamera::new().with_callback(args.callback);
    if let Some(len) = args.frame_len {
        camera = camera.with_frame_len(len);
    }
    if let Some(resolution) = args.max_resolution {
        camera = camera.with_max_resolution(resolution);
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut device = Device::new(camera, link);
    device
        .begin(globals.baud_rate)
        .map_err(|err| device_error("link setup failed", err))?;
    tracing::info!(port = %args.port, baud = globals.baud_rate, "emulating camera module");

    device
        .run(&running)
        .map_err(|err| device_error("device loop failed", err))?;

    let calls = device.session().camera().calls().len();
    tracing::info!(calls, "emulator stopped");
    Ok(SUCCESS)
}
