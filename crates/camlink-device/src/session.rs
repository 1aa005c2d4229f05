use crate::camera::Camera;
use crate::streamer::ImageStreamer;
use crate::values::{PixelFormat, Resolution};

/// Resolution a fresh or reset session captures at.
pub const DEFAULT_PICTURE_RESOLUTION: Resolution = Resolution::QVGA;

/// Pixel format a fresh or reset session captures in.
pub const DEFAULT_PIXEL_FORMAT: PixelFormat = PixelFormat::JPEG;

/// Everything one connected host can change on the device.
///
/// Owns the camera plus the picture mode that TAKE_PICTURE reuses. The
/// dispatcher borrows the session mutably for the whole command, image
/// transfer included, so commands are handled strictly one at a time.
#[derive(Debug)]
pub struct Session<C> {
    camera: C,
    picture_resolution: Resolution,
    pixel_format: PixelFormat,
    video_resolution: Option<Resolution>,
    previewing: bool,
    streamer: ImageStreamer,
}

impl<C: Camera> Session<C> {
    pub fn new(camera: C) -> Self {
        Self::with_streamer(camera, ImageStreamer::new())
    }

    pub fn with_streamer(camera: C, streamer: ImageStreamer) -> Self {
        Self {
            camera,
            picture_resolution: DEFAULT_PICTURE_RESOLUTION,
            pixel_format: DEFAULT_PIXEL_FORMAT,
            video_resolution: None,
            previewing: false,
            streamer,
        }
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    pub fn into_camera(self) -> C {
        self.camera
    }

    pub fn picture_resolution(&self) -> Resolution {
        self.picture_resolution
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Last resolution requested with SET_VIDEO_RESOLUTION.
    pub fn video_resolution(&self) -> Option<Resolution> {
        self.video_resolution
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub fn streamer(&self) -> &ImageStreamer {
        &self.streamer
    }

    pub(crate) fn set_picture_mode(&mut self, resolution: Resolution, format: PixelFormat) {
        self.picture_resolution = resolution;
        self.pixel_format = format;
    }

    pub(crate) fn set_video_resolution(&mut self, resolution: Resolution) {
        self.video_resolution = Some(resolution);
    }

    pub(crate) fn set_previewing(&mut self, previewing: bool) {
        self.previewing = previewing;
    }

    /// Forget everything the host has set.
    pub(crate) fn reset_bookkeeping(&mut self) {
        self.picture_resolution = DEFAULT_PICTURE_RESOLUTION;
        self.pixel_format = DEFAULT_PIXEL_FORMAT;
        self.video_resolution = None;
        self.previewing = false;
        self.streamer.abandon();
    }

    /// Split into the camera and the streamer for an image transfer.
    pub(crate) fn camera_and_streamer(&mut self) -> (&mut C, &mut ImageStreamer) {
        (&mut self.camera, &mut self.streamer)
    }
}
