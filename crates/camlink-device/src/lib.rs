//! Device side of the camlink protocol.
//!
//! A host sends single opcode bytes, some followed by up to three raw
//! argument bytes. This crate turns those bytes into [`Command`]s, runs each
//! against a [`Camera`] through [`dispatch`], and answers with framed
//! replies: info records, version blobs, text notices, and captured images
//! streamed in windows of at most [`WINDOW`] bytes.
//!
//! [`Device`] ties it together over a [`camlink_transport::Transport`].
//! [`SimulatedCamera`] stands in for real hardware.

pub mod camera;
pub mod command;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod opcode;
pub mod report;
pub mod session;
pub mod sim;
pub mod streamer;
pub mod values;

pub use camera::{Camera, CameraInfo, CameraResult};
pub use command::{pack_picture_mode, unpack_picture_mode, Command, CommandAssembler, MAX_ARGS};
pub use device::Device;
pub use dispatch::{dispatch, dispatch_raw, take_and_stream, Outcome, Warning, MISSING_CALLBACK_TEXT};
pub use error::{CapabilityError, CommandError, DeviceError, Result};
pub use opcode::{arity_of, Opcode};
pub use report::{
    report_camera_info, report_firmware_version, report_sdk_version, send_message, send_text,
};
pub use session::{Session, DEFAULT_PICTURE_RESOLUTION, DEFAULT_PIXEL_FORMAT};
pub use sim::{CameraCall, SimulatedCamera};
pub use streamer::{ImageStreamer, StreamState, TransferStats, WINDOW};
pub use values::{
    BrightnessLevel, ColorEffect, ContrastLevel, EvLevel, FocusControl, ImageQuality, PixelFormat,
    Resolution, SaturationLevel, SharpnessLevel, WhiteBalanceMode,
};
