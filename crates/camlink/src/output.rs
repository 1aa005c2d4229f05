use std::io::{IsTerminal, Write};

use camlink_device::CameraInfo;
use camlink_frame::{msg_type_name, Packet, CAMERA_INFO, FIRMWARE_VERSION, IMAGE, SDK_VERSION};
use camlink_transport::PortInfo;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    msg_type: u8,
    type_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    descriptor: Option<u8>,
    payload_size: usize,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera_info: Option<CameraInfo>,
}

pub fn print_packet(packet: &Packet, format: OutputFormat) {
    let preview = payload_preview(packet);
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                msg_type: packet.msg_type,
                type_name: msg_type_name(packet.msg_type),
                descriptor: packet.descriptor,
                payload_size: packet.payload.len(),
                payload: preview,
                camera_info: camera_info(packet),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "DESCRIPTOR", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    format!("0x{:02X} {}", packet.msg_type, msg_type_name(packet.msg_type)),
                    packet
                        .descriptor
                        .map(|d| format!("0x{d:02X}"))
                        .unwrap_or_else(|| "-".to_string()),
                    packet.payload.len().to_string(),
                    preview,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let descriptor = packet
                .descriptor
                .map(|d| format!(" descriptor=0x{d:02X}"))
                .unwrap_or_default();
            println!(
                "type=0x{:02X} ({}){} size={} payload={}",
                packet.msg_type,
                msg_type_name(packet.msg_type),
                descriptor,
                packet.payload.len(),
                preview
            );
        }
        OutputFormat::Raw => print_raw(packet.payload.as_ref()),
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<&'a str>,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|p| PortOutput {
                    name: &p.name,
                    vid: p.vid,
                    pid: p.pid,
                    product: p.product.as_deref(),
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "VID:PID", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    usb_id(port),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for port in ports {
                println!("{} {}", port.name, usb_id(port));
            }
        }
    }
}

#[derive(Serialize)]
pub struct CaptureOutput<'a> {
    pub path: &'a str,
    pub resolution: &'a str,
    pub pixel_format: &'a str,
    pub descriptor: Option<u8>,
    pub bytes: usize,
}

pub fn print_capture(out: &CaptureOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FILE", "RESOLUTION", "FORMAT", "BYTES"])
                .add_row(vec![
                    out.path.to_string(),
                    out.resolution.to_string(),
                    out.pixel_format.to_string(),
                    out.bytes.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "saved {} bytes ({} {}) to {}",
                out.bytes, out.resolution, out.pixel_format, out.path
            );
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn usb_id(port: &PortInfo) -> String {
    match (port.vid, port.pid) {
        (Some(vid), Some(pid)) => format!("{vid:04x}:{pid:04x}"),
        _ => "-".to_string(),
    }
}

fn camera_info(packet: &Packet) -> Option<CameraInfo> {
    if packet.msg_type != CAMERA_INFO {
        return None;
    }
    std::str::from_utf8(&packet.payload)
        .ok()
        .and_then(CameraInfo::parse)
}

fn payload_preview(packet: &Packet) -> String {
    let payload = packet.payload.as_ref();
    match packet.msg_type {
        IMAGE => format!("<image {} bytes>", payload.len()),
        FIRMWARE_VERSION | SDK_VERSION => hex(payload.strip_suffix(b"\r\n").unwrap_or(payload)),
        _ => match std::str::from_utf8(payload) {
            Ok(text) => text.trim_end_matches("\r\n").replace("\r\n", " | "),
            Err(_) => format!("<binary {} bytes>", payload.len()),
        },
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
