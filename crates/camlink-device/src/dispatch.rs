//! Opcode dispatch.
//!
//! Each command turns into one camera operation and/or one reply. Camera
//! failures never fail the dispatch: they come back as a warning in the
//! [`Outcome`], and only the missing-callback case shows up on the wire.
//! `Err` is reserved for a broken link or a broken image transfer.

use std::io::Write;

use camlink_frame::{image_descriptor, PacketWriter};

use crate::camera::{Camera, CameraResult};
use crate::command::{unpack_picture_mode, Command};
use crate::error::{CapabilityError, CommandError, Result};
use crate::opcode::Opcode;
use crate::report::{report_camera_info, report_firmware_version, report_sdk_version, send_message};
use crate::session::Session;
use crate::streamer::TransferStats;
use crate::values::{
    BrightnessLevel, ColorEffect, ContrastLevel, EvLevel, FocusControl, ImageQuality,
    Resolution, SaturationLevel, SharpnessLevel, WhiteBalanceMode,
};

/// How a command was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The camera accepted the command.
    Handled,
    /// The command ran but the camera reported a problem.
    HandledWithWarning(Warning),
    /// Not an opcode this device knows; nothing happened.
    UnknownOpcode(u8),
    /// The argument bytes did not fit the opcode; nothing happened.
    Rejected(CommandError),
}

impl Outcome {
    /// True for `Handled` and `HandledWithWarning`.
    pub fn was_handled(&self) -> bool {
        matches!(self, Outcome::Handled | Outcome::HandledWithWarning(_))
    }
}

/// A problem reported while handling a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Preview was requested with no output callback registered. The host
    /// was told with a TEXT reply.
    MissingCallback,
    /// The camera rejected or failed an operation.
    Capability {
        opcode: Opcode,
        error: CapabilityError,
    },
}

/// Text sent to the host when preview has nowhere to go.
pub const MISSING_CALLBACK_TEXT: &str = "callback function is not registered";

/// Validate a raw opcode and argument bytes, then dispatch.
///
/// Argument bytes that do not match the opcode are rejected before the
/// camera is touched.
pub fn dispatch_raw<C, W>(
    session: &mut Session<C>,
    writer: &mut PacketWriter<W>,
    opcode: u8,
    args: &[u8],
) -> Result<Outcome>
where
    C: Camera,
    W: Write,
{
    match Command::new(opcode, args) {
        Ok(command) => dispatch(session, writer, &command),
        Err(err) => {
            tracing::warn!(opcode, error = %err, "command rejected");
            Ok(Outcome::Rejected(err))
        }
    }
}

/// Run one command to completion, image transfer included.
pub fn dispatch<C, W>(
    session: &mut Session<C>,
    writer: &mut PacketWriter<W>,
    command: &Command,
) -> Result<Outcome>
where
    C: Camera,
    W: Write,
{
    let Some(op) = command.known_opcode() else {
        tracing::debug!(opcode = command.opcode(), "unknown opcode ignored");
        return Ok(Outcome::UnknownOpcode(command.opcode()));
    };
    tracing::debug!(opcode = %op, args = ?command.args(), "dispatching command");

    let arg = command.arg(0);
    let outcome = match op {
        Opcode::Reset => {
            let result = session.camera_mut().reset();
            session.reset_bookkeeping();
            settle(op, result)
        }
        Opcode::SetPictureResolution => {
            let (resolution, format) = unpack_picture_mode(arg);
            session.set_picture_mode(resolution, format);
            let result = session.camera_mut().take_picture(resolution, format);
            settle(op, result)
        }
        Opcode::SetVideoResolution => {
            let resolution = Resolution(arg & 0x0F);
            session.set_video_resolution(resolution);
            match session.camera_mut().start_preview(resolution) {
                Ok(()) => {
                    session.set_previewing(true);
                    Outcome::Handled
                }
                Err(CapabilityError::NoCallback) => {
                    tracing::warn!("preview requested with no callback registered");
                    send_message(writer, MISSING_CALLBACK_TEXT)?;
                    Outcome::HandledWithWarning(Warning::MissingCallback)
                }
                Err(err) => settle(op, Err(err)),
            }
        }
        Opcode::SetBrightness => settle(op, session.camera_mut().set_brightness(BrightnessLevel(arg))),
        Opcode::SetContrast => settle(op, session.camera_mut().set_contrast(ContrastLevel(arg))),
        Opcode::SetSaturation => {
            settle(op, session.camera_mut().set_saturation(SaturationLevel(arg)))
        }
        Opcode::SetEv => settle(op, session.camera_mut().set_ev(EvLevel(arg))),
        Opcode::SetSharpness => settle(op, session.camera_mut().set_sharpness(SharpnessLevel(arg))),
        Opcode::SetImageQuality => {
            settle(op, session.camera_mut().set_image_quality(ImageQuality(arg)))
        }
        Opcode::SetWhiteBalance => settle(
            op,
            session
                .camera_mut()
                .set_white_balance_mode(WhiteBalanceMode(arg)),
        ),
        Opcode::SetSpecialEffects => {
            settle(op, session.camera_mut().set_color_effect(ColorEffect(arg)))
        }
        Opcode::SetFocusControl => {
            let camera = session.camera_mut();
            let first = camera.set_auto_focus(FocusControl(arg));
            // Disabling focus is always followed by a one-shot trigger.
            let second = if FocusControl(arg) == FocusControl::DISABLE {
                camera.set_auto_focus(FocusControl::ONE_SHOT)
            } else {
                Ok(())
            };
            settle(op, first.and(second))
        }
        Opcode::SetExposureAndGainControl => {
            let enable = arg & 0x01 == 0x01;
            let camera = session.camera_mut();
            let exposure = camera.set_auto_exposure(enable);
            let gain = camera.set_auto_iso_sensitive(enable);
            settle(op, exposure.and(gain))
        }
        Opcode::SetWhiteBalanceControl => settle(
            op,
            session.camera_mut().set_auto_white_balance(arg & 0x01 == 0x01),
        ),
        Opcode::SetManualGain => {
            let gain = u16::from_be_bytes([command.arg(0), command.arg(1)]);
            settle(op, session.camera_mut().set_iso_sensitivity(gain))
        }
        Opcode::SetManualExposure => {
            let exposure = u32::from_be_bytes([0, command.arg(0), command.arg(1), command.arg(2)]);
            settle(op, session.camera_mut().set_absolute_exposure(exposure))
        }
        Opcode::DebugWriteRegister => {
            let bytes = [command.arg(0), command.arg(1), command.arg(2)];
            settle(op, session.camera_mut().debug_write_register(bytes))
        }
        Opcode::GetCameraInfo => {
            report_camera_info(session.camera(), writer)?;
            Outcome::Handled
        }
        Opcode::GetFirmwareVersion => {
            report_firmware_version(session.camera(), writer)?;
            Outcome::Handled
        }
        Opcode::GetSdkVersion => {
            report_sdk_version(session.camera(), writer)?;
            Outcome::Handled
        }
        Opcode::TakePicture => {
            let (outcome, _) = take_and_stream(session, writer)?;
            outcome
        }
        Opcode::StopStream => {
            let result = session.camera_mut().stop_preview();
            session.set_previewing(false);
            settle(op, result)
        }
    };

    Ok(outcome)
}

/// Capture in the session's picture mode, then stream the frame.
///
/// A failed capture is still followed by a transfer of whatever the camera
/// holds, so the host always receives an image reply.
pub fn take_and_stream<C, W>(
    session: &mut Session<C>,
    writer: &mut PacketWriter<W>,
) -> Result<(Outcome, TransferStats)>
where
    C: Camera,
    W: Write,
{
    let resolution = session.picture_resolution();
    let format = session.pixel_format();
    let capture = session.camera_mut().take_picture(resolution, format);
    let outcome = settle(Opcode::TakePicture, capture);

    let (camera, streamer) = session.camera_and_streamer();
    let stats = streamer.drain(camera, writer, image_descriptor(resolution.0))?;
    Ok((outcome, stats))
}

fn settle(opcode: Opcode, result: CameraResult) -> Outcome {
    match result {
        Ok(()) => Outcome::Handled,
        Err(error) => {
            tracing::warn!(%opcode, %error, "camera rejected command");
            Outcome::HandledWithWarning(Warning::Capability { opcode, error })
        }
    }
}
