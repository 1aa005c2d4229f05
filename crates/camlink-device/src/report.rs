//! Fixed-format info replies.
//!
//! Reporters only borrow the camera, so they cannot disturb its settings or
//! the capture cursor.

use std::fmt::Write as _;
use std::io::Write;

use camlink_frame::{PacketWriter, CAMERA_INFO, FIRMWARE_VERSION, SDK_VERSION, TEXT};

use crate::camera::{Camera, CameraInfo};
use crate::error::Result;

const LINE_END: &[u8; 2] = b"\r\n";
const INFO_TITLE: &str = "ReportCameraInfo";

/// Send the camera's capability record as a CAMERA_INFO text reply.
pub fn report_camera_info<C, W>(camera: &C, writer: &mut PacketWriter<W>) -> Result<()>
where
    C: Camera + ?Sized,
    W: Write,
{
    let text = camera.info().render();
    writer.send(CAMERA_INFO, text.as_bytes())?;
    Ok(())
}

/// Send the 4 firmware version bytes followed by CRLF.
pub fn report_firmware_version<C, W>(camera: &C, writer: &mut PacketWriter<W>) -> Result<()>
where
    C: Camera + ?Sized,
    W: Write,
{
    let mut payload = [0u8; 6];
    payload[..4].copy_from_slice(&camera.firmware_version());
    payload[4..].copy_from_slice(LINE_END);
    writer.send(FIRMWARE_VERSION, &payload)?;
    Ok(())
}

/// Send the 5 SDK version bytes followed by CRLF.
pub fn report_sdk_version<C, W>(camera: &C, writer: &mut PacketWriter<W>) -> Result<()>
where
    C: Camera + ?Sized,
    W: Write,
{
    let mut payload = [0u8; 7];
    payload[..5].copy_from_slice(&camera.sdk_version());
    payload[5..].copy_from_slice(LINE_END);
    writer.send(SDK_VERSION, &payload)?;
    Ok(())
}

/// Send `message` followed by CRLF under `msg_type` (usually [`TEXT`]).
pub fn send_text<W: Write>(writer: &mut PacketWriter<W>, msg_type: u8, message: &str) -> Result<()> {
    let mut payload = Vec::with_capacity(message.len() + LINE_END.len());
    payload.extend_from_slice(message.as_bytes());
    payload.extend_from_slice(LINE_END);
    writer.send(msg_type, &payload)?;
    Ok(())
}

/// [`send_text`] with the generic TEXT type.
pub fn send_message<W: Write>(writer: &mut PacketWriter<W>, message: &str) -> Result<()> {
    send_text(writer, TEXT, message)
}

impl CameraInfo {
    /// The CRLF-separated `Key:value` text sent in a CAMERA_INFO reply.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(256);
        let _ = write!(
            out,
            "{INFO_TITLE}\r\n\
             Camera Type:{}\r\n\
             Camera Support Resolution:{}\r\n\
             Camera Support specialeffects:{}\r\n\
             Camera Support Focus:{}\r\n\
             Camera Exposure Value Max:{}\r\n\
             Camera Exposure Value Min:{}\r\n\
             Camera Gain Value Max:{}\r\n\
             Camera Gain Value Min:{}\r\n\
             Camera Support Sharpness:{}\r\n",
            self.camera_id,
            self.support_resolution,
            self.support_special_effects,
            self.support_focus,
            self.exposure_value_max,
            self.exposure_value_min,
            self.gain_value_max,
            self.gain_value_min,
            self.support_sharpness,
        );
        out
    }

    /// Parse the text of a CAMERA_INFO reply back into a record.
    ///
    /// Returns `None` unless every field is present and numeric where it
    /// should be.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.split("\r\n").filter(|line| !line.is_empty());
        if lines.next()? != INFO_TITLE {
            return None;
        }

        let mut fields = std::collections::HashMap::new();
        for line in lines {
            let (key, value) = line.split_once(':')?;
            fields.insert(key, value);
        }
        let get = |key: &str| fields.get(key).copied();

        Some(Self {
            camera_id: get("Camera Type")?.to_string(),
            support_resolution: get("Camera Support Resolution")?.parse().ok()?,
            support_special_effects: get("Camera Support specialeffects")?.parse().ok()?,
            support_focus: get("Camera Support Focus")?.parse().ok()?,
            exposure_value_max: get("Camera Exposure Value Max")?.parse().ok()?,
            exposure_value_min: get("Camera Exposure Value Min")?.parse().ok()?,
            gain_value_max: get("Camera Gain Value Max")?.parse().ok()?,
            gain_value_min: get("Camera Gain Value Min")?.parse().ok()?,
            support_sharpness: get("Camera Support Sharpness")?.parse().ok()?,
        })
    }
}
