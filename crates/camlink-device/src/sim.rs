//! A camera with no hardware behind it.
//!
//! Captures produce deterministic synthetic frames sized from the requested
//! resolution and format, and every camera call is logged so tests can
//! check exactly what the dispatcher asked for.

use crate::camera::{Camera, CameraInfo, CameraResult};
use crate::error::CapabilityError;
use crate::values::{
    BrightnessLevel, ColorEffect, ContrastLevel, EvLevel, FocusControl, ImageQuality, PixelFormat,
    Resolution, SaturationLevel, SharpnessLevel, WhiteBalanceMode,
};

/// Largest synthetic frame, whatever the resolution.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

/// One recorded camera call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCall {
    Reset,
    TakePicture(Resolution, PixelFormat),
    StartPreview(Resolution),
    StopPreview,
    Brightness(BrightnessLevel),
    Contrast(ContrastLevel),
    Saturation(SaturationLevel),
    Ev(EvLevel),
    Sharpness(SharpnessLevel),
    ImageQuality(ImageQuality),
    WhiteBalanceMode(WhiteBalanceMode),
    ColorEffect(ColorEffect),
    AutoFocus(FocusControl),
    AutoExposure(bool),
    AutoIsoSensitive(bool),
    AutoWhiteBalance(bool),
    IsoSensitivity(u16),
    AbsoluteExposure(u32),
    DebugWriteRegister([u8; 3]),
}

/// Simulated camera module.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    info: CameraInfo,
    firmware: [u8; 4],
    sdk: [u8; 5],
    max_resolution: Resolution,
    callback: bool,
    frame_len_override: Option<usize>,
    frame_seed: u8,
    frame: Vec<u8>,
    cursor: usize,
    stall_at: Option<usize>,
    read_error: Option<CapabilityError>,
    previewing: bool,
    calls: Vec<CameraCall>,
    read_sizes: Vec<usize>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            info: default_info(),
            firmware: [0x20, 0x24, 0x01, 0x15],
            sdk: [0x02, 0x00, 0x01, 0x00, 0x00],
            max_resolution: Resolution::WQXGA2,
            callback: false,
            frame_len_override: None,
            frame_seed: 0,
            frame: Vec::new(),
            cursor: 0,
            stall_at: None,
            read_error: None,
            previewing: false,
            calls: Vec::new(),
            read_sizes: Vec::new(),
        }
    }

    pub fn with_info(mut self, info: CameraInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_firmware_version(mut self, version: [u8; 4]) -> Self {
        self.firmware = version;
        self
    }

    pub fn with_sdk_version(mut self, version: [u8; 5]) -> Self {
        self.sdk = version;
        self
    }

    /// Reject captures and previews above `resolution`.
    pub fn with_max_resolution(mut self, resolution: Resolution) -> Self {
        self.max_resolution = resolution;
        self
    }

    /// Whether a preview consumer is registered.
    pub fn with_callback(mut self, registered: bool) -> Self {
        self.callback = registered;
        self
    }

    /// Make every capture exactly `len` bytes long.
    pub fn with_frame_len(mut self, len: usize) -> Self {
        self.frame_len_override = Some(len.min(MAX_FRAME_LEN));
        self
    }

    /// Stop handing out bytes once `offset` bytes of a capture have been read.
    pub fn stall_after(&mut self, offset: usize) {
        self.stall_at = Some(offset);
    }

    /// Fail every following buffer read with `error`.
    pub fn fail_reads(&mut self, error: CapabilityError) {
        self.read_error = Some(error);
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> &[CameraCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Sizes of the buffer reads since the last capture.
    pub fn read_sizes(&self) -> &[usize] {
        &self.read_sizes
    }

    /// The whole current capture.
    pub fn frame_bytes(&self) -> &[u8] {
        &self.frame
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    fn check_resolution(&self, resolution: Resolution) -> CameraResult {
        if resolution.0 > self.max_resolution.0 {
            return Err(CapabilityError::Unsupported {
                setting: "resolution",
                value: u32::from(resolution.0),
            });
        }
        Ok(())
    }

    fn frame_len(&self, resolution: Resolution, format: PixelFormat) -> usize {
        if let Some(len) = self.frame_len_override {
            return len;
        }
        let (w, h) = resolution.dimensions().unwrap_or((320, 240));
        let pixels = w as usize * h as usize;
        let len = if format == PixelFormat::JPEG {
            pixels / 10
        } else {
            pixels * 2
        };
        len.min(MAX_FRAME_LEN)
    }

    fn capture(&mut self, resolution: Resolution, format: PixelFormat) {
        let len = self.frame_len(resolution, format);
        let seed = self.frame_seed;
        self.frame_seed = self.frame_seed.wrapping_add(1);

        self.frame = (0..len)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect();
        if format == PixelFormat::JPEG && len >= 4 {
            self.frame[..2].copy_from_slice(&[0xFF, 0xD8]);
            self.frame[len - 2..].copy_from_slice(&[0xFF, 0xD9]);
        }
        self.cursor = 0;
        self.read_sizes.clear();
    }

    fn record(&mut self, call: CameraCall) -> CameraResult {
        self.calls.push(call);
        Ok(())
    }
}

fn default_info() -> CameraInfo {
    CameraInfo {
        camera_id: "5MP".to_string(),
        support_resolution: 7894,
        support_special_effects: 63,
        support_focus: 1,
        exposure_value_max: 30000,
        exposure_value_min: 1,
        gain_value_max: 1023,
        gain_value_min: 1,
        support_sharpness: 0,
    }
}

impl Camera for SimulatedCamera {
    fn reset(&mut self) -> CameraResult {
        self.previewing = false;
        self.frame.clear();
        self.cursor = 0;
        self.read_sizes.clear();
        self.record(CameraCall::Reset)
    }

    fn take_picture(&mut self, resolution: Resolution, format: PixelFormat) -> CameraResult {
        self.calls.push(CameraCall::TakePicture(resolution, format));
        self.check_resolution(resolution)?;
        if !format.is_known() {
            return Err(CapabilityError::Unsupported {
                setting: "pixel format",
                value: u32::from(format.0),
            });
        }
        self.capture(resolution, format);
        Ok(())
    }

    fn start_preview(&mut self, resolution: Resolution) -> CameraResult {
        self.calls.push(CameraCall::StartPreview(resolution));
        if !self.callback {
            return Err(CapabilityError::NoCallback);
        }
        self.check_resolution(resolution)?;
        self.previewing = true;
        Ok(())
    }

    fn stop_preview(&mut self) -> CameraResult {
        self.previewing = false;
        self.record(CameraCall::StopPreview)
    }

    fn set_brightness(&mut self, level: BrightnessLevel) -> CameraResult {
        self.record(CameraCall::Brightness(level))
    }

    fn set_contrast(&mut self, level: ContrastLevel) -> CameraResult {
        self.record(CameraCall::Contrast(level))
    }

    fn set_saturation(&mut self, level: SaturationLevel) -> CameraResult {
        self.record(CameraCall::Saturation(level))
    }

    fn set_ev(&mut self, level: EvLevel) -> CameraResult {
        self.record(CameraCall::Ev(level))
    }

    fn set_sharpness(&mut self, level: SharpnessLevel) -> CameraResult {
        self.record(CameraCall::Sharpness(level))
    }

    fn set_image_quality(&mut self, quality: ImageQuality) -> CameraResult {
        self.record(CameraCall::ImageQuality(quality))
    }

    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode) -> CameraResult {
        self.record(CameraCall::WhiteBalanceMode(mode))
    }

    fn set_color_effect(&mut self, effect: ColorEffect) -> CameraResult {
        self.record(CameraCall::ColorEffect(effect))
    }

    fn set_auto_focus(&mut self, control: FocusControl) -> CameraResult {
        self.record(CameraCall::AutoFocus(control))
    }

    fn set_auto_exposure(&mut self, enable: bool) -> CameraResult {
        self.record(CameraCall::AutoExposure(enable))
    }

    fn set_auto_iso_sensitive(&mut self, enable: bool) -> CameraResult {
        self.record(CameraCall::AutoIsoSensitive(enable))
    }

    fn set_auto_white_balance(&mut self, enable: bool) -> CameraResult {
        self.record(CameraCall::AutoWhiteBalance(enable))
    }

    fn set_iso_sensitivity(&mut self, gain: u16) -> CameraResult {
        self.record(CameraCall::IsoSensitivity(gain))
    }

    fn set_absolute_exposure(&mut self, exposure: u32) -> CameraResult {
        self.record(CameraCall::AbsoluteExposure(exposure))
    }

    fn debug_write_register(&mut self, bytes: [u8; 3]) -> CameraResult {
        self.record(CameraCall::DebugWriteRegister(bytes))
    }

    fn total_length(&self) -> u32 {
        self.frame.len() as u32
    }

    fn remaining_length(&self) -> u32 {
        (self.frame.len() - self.cursor) as u32
    }

    fn read_buff(&mut self, buf: &mut [u8]) -> CameraResult<usize> {
        if let Some(error) = &self.read_error {
            return Err(error.clone());
        }
        let mut end = self.frame.len().min(self.cursor + buf.len());
        if let Some(stall) = self.stall_at {
            end = end.min(stall.max(self.cursor));
        }
        let n = end - self.cursor;
        buf[..n].copy_from_slice(&self.frame[self.cursor..end]);
        self.cursor = end;
        if n > 0 {
            self.read_sizes.push(n);
        }
        Ok(n)
    }

    fn info(&self) -> &CameraInfo {
        &self.info
    }

    fn firmware_version(&self) -> [u8; 4] {
        self.firmware
    }

    fn sdk_version(&self) -> [u8; 5] {
        self.sdk
    }
}
