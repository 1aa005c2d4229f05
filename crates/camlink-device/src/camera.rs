//! The camera capability interface the dispatcher drives.

use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use crate::values::{
    BrightnessLevel, ColorEffect, ContrastLevel, EvLevel, FocusControl, ImageQuality, PixelFormat,
    Resolution, SaturationLevel, SharpnessLevel, WhiteBalanceMode,
};

pub type CameraResult<T = ()> = std::result::Result<T, CapabilityError>;

/// Capability constants a camera reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub camera_id: String,
    pub support_resolution: u16,
    pub support_special_effects: u16,
    pub support_focus: u8,
    pub exposure_value_max: u32,
    pub exposure_value_min: u32,
    pub gain_value_max: u16,
    pub gain_value_min: u16,
    pub support_sharpness: u8,
}

/// A camera module as seen by the command dispatcher.
///
/// Settings take raw wire values; the camera decides what it supports and
/// answers [`CapabilityError::Unsupported`] otherwise.
///
/// A capture leaves the encoded frame in the camera's buffer.
/// [`total_length`](Camera::total_length) reports its size and
/// [`read_buff`](Camera::read_buff) drains it front to back, lowering
/// [`remaining_length`](Camera::remaining_length) as it goes. Only a new
/// capture resets the cursor.
pub trait Camera {
    fn reset(&mut self) -> CameraResult;

    /// Capture one frame into the buffer.
    fn take_picture(&mut self, resolution: Resolution, format: PixelFormat) -> CameraResult;

    /// Start continuous preview at `resolution`.
    ///
    /// Fails with [`CapabilityError::NoCallback`] when no frame consumer
    /// has been registered.
    fn start_preview(&mut self, resolution: Resolution) -> CameraResult;

    fn stop_preview(&mut self) -> CameraResult;

    fn set_brightness(&mut self, level: BrightnessLevel) -> CameraResult;
    fn set_contrast(&mut self, level: ContrastLevel) -> CameraResult;
    fn set_saturation(&mut self, level: SaturationLevel) -> CameraResult;
    fn set_ev(&mut self, level: EvLevel) -> CameraResult;
    fn set_sharpness(&mut self, level: SharpnessLevel) -> CameraResult;
    fn set_image_quality(&mut self, quality: ImageQuality) -> CameraResult;
    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode) -> CameraResult;
    fn set_color_effect(&mut self, effect: ColorEffect) -> CameraResult;
    fn set_auto_focus(&mut self, control: FocusControl) -> CameraResult;
    fn set_auto_exposure(&mut self, enable: bool) -> CameraResult;
    fn set_auto_iso_sensitive(&mut self, enable: bool) -> CameraResult;
    fn set_auto_white_balance(&mut self, enable: bool) -> CameraResult;
    fn set_iso_sensitivity(&mut self, gain: u16) -> CameraResult;

    /// Manual exposure time (24 significant bits).
    fn set_absolute_exposure(&mut self, exposure: u32) -> CameraResult;

    /// Raw register write, bytes as received.
    fn debug_write_register(&mut self, bytes: [u8; 3]) -> CameraResult;

    /// Size of the last capture in bytes.
    fn total_length(&self) -> u32;

    /// Bytes of the last capture not yet read.
    fn remaining_length(&self) -> u32;

    /// Copy the next bytes of the capture into `buf`, returning how many
    /// were copied. Never more than `remaining_length()`.
    fn read_buff(&mut self, buf: &mut [u8]) -> CameraResult<usize>;

    fn info(&self) -> &CameraInfo;

    fn firmware_version(&self) -> [u8; 4];

    fn sdk_version(&self) -> [u8; 5];
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn reset(&mut self) -> CameraResult {
        (**self).reset()
    }
    fn take_picture(&mut self, resolution: Resolution, format: PixelFormat) -> CameraResult {
        (**self).take_picture(resolution, format)
    }
    fn start_preview(&mut self, resolution: Resolution) -> CameraResult {
        (**self).start_preview(resolution)
    }
    fn stop_preview(&mut self) -> CameraResult {
        (**self).stop_preview()
    }
    fn set_brightness(&mut self, level: BrightnessLevel) -> CameraResult {
        (**self).set_brightness(level)
    }
    fn set_contrast(&mut self, level: ContrastLevel) -> CameraResult {
        (**self).set_contrast(level)
    }
    fn set_saturation(&mut self, level: SaturationLevel) -> CameraResult {
        (**self).set_saturation(level)
    }
    fn set_ev(&mut self, level: EvLevel) -> CameraResult {
        (**self).set_ev(level)
    }
    fn set_sharpness(&mut self, level: SharpnessLevel) -> CameraResult {
        (**self).set_sharpness(level)
    }
    fn set_image_quality(&mut self, quality: ImageQuality) -> CameraResult {
        (**self).set_image_quality(quality)
    }
    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode) -> CameraResult {
        (**self).set_white_balance_mode(mode)
    }
    fn set_color_effect(&mut self, effect: ColorEffect) -> CameraResult {
        (**self).set_color_effect(effect)
    }
    fn set_auto_focus(&mut self, control: FocusControl) -> CameraResult {
        (**self).set_auto_focus(control)
    }
    fn set_auto_exposure(&mut self, enable: bool) -> CameraResult {
        (**self).set_auto_exposure(enable)
    }
    fn set_auto_iso_sensitive(&mut self, enable: bool) -> CameraResult {
        (**self).set_auto_iso_sensitive(enable)
    }
    fn set_auto_white_balance(&mut self, enable: bool) -> CameraResult {
        (**self).set_auto_white_balance(enable)
    }
    fn set_iso_sensitivity(&mut self, gain: u16) -> CameraResult {
        (**self).set_iso_sensitivity(gain)
    }
    fn set_absolute_exposure(&mut self, exposure: u32) -> CameraResult {
        (**self).set_absolute_exposure(exposure)
    }
    fn debug_write_register(&mut self, bytes: [u8; 3]) -> CameraResult {
        (**self).debug_write_register(bytes)
    }
    fn total_length(&self) -> u32 {
        (**self).total_length()
    }
    fn remaining_length(&self) -> u32 {
        (**self).remaining_length()
    }
    fn read_buff(&mut self, buf: &mut [u8]) -> CameraResult<usize> {
        (**self).read_buff(buf)
    }
    fn info(&self) -> &CameraInfo {
        (**self).info()
    }
    fn firmware_version(&self) -> [u8; 4] {
        (**self).firmware_version()
    }
    fn sdk_version(&self) -> [u8; 5] {
        (**self).sdk_version()
    }
}
