//! Host and simulated camera talking over an in-memory link.
//!
//! Run with:
//!   cargo run --example loopback
//!
//! The link moves one byte per call in each direction, like a slow UART.

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::thread;

use camlink::device::{Command, Device, PixelFormat, Resolution, SimulatedCamera};
use camlink::frame::{msg_type_name, PacketReader};
use camlink::transport::MemoryLink;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (device_end, host_end) = MemoryLink::pair();
    let device_end = device_end.with_chunk_limit(1);

    let device = thread::spawn(move || {
        let running = AtomicBool::new(true);
        let mut device = Device::new(SimulatedCamera::new(), device_end);
        device.run(&running)
    });

    let mut host = host_end.with_chunk_limit(1);
    let mut request = Vec::new();
    request.extend(Command::get_firmware_version().to_bytes());
    request.extend(Command::get_camera_info().to_bytes());
    request.extend(Command::set_picture_resolution(Resolution::VGA, PixelFormat::JPEG).to_bytes());
    request.extend(Command::take_picture().to_bytes());
    host.write_all(&request)?;

    let mut reader = PacketReader::new(host);
    for _ in 0..3 {
        let packet = reader.read_packet()?;
        eprintln!(
            "{} ({} bytes){}",
            msg_type_name(packet.msg_type),
            packet.payload.len(),
            packet
                .descriptor
                .map(|d| format!(" descriptor=0x{d:02X}"))
                .unwrap_or_default()
        );
    }

    // Hanging up ends the device loop.
    drop(reader);
    device
        .join()
        .map_err(|_| "device thread panicked")??;
    Ok(())
}
