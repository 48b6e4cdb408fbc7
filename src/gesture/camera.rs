//! Camera capture.
//!
//! Provides cross-platform camera capture using the nokhwa crate.
//! [`CameraProvider::open`] hands back a [`FrameSource`] that owns the
//! device; dropping the source stops the stream and releases the camera.
//! Sources are not `Send` (platform camera handles are thread-bound), so
//! they are opened on, and never leave, the thread that reads them.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One RGB8 video frame, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Frame {
    /// Horizontally flipped copy (selfie view).
    pub fn mirrored(&self) -> Frame {
        let row_bytes = self.width as usize * 3;
        let mut rgb = Vec::with_capacity(self.rgb.len());
        for row in self.rgb.chunks_exact(row_bytes.max(1)) {
            for px in row.chunks_exact(3).rev() {
                rgb.extend_from_slice(px);
            }
        }
        Frame {
            width: self.width,
            height: self.height,
            rgb,
        }
    }

    /// RGB of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera {index}: {reason}")]
    Open { index: u32, reason: String },

    #[error("failed to start camera stream: {0}")]
    Stream(String),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to capture frame: {0}")]
    Capture(String),

    #[error("failed to decode frame: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An open camera.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Frame, FrameError>;
}

/// Opens cameras on demand.
pub trait CameraProvider: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>, CameraError>;
}

// ---------------------------------------------------------------------------
// NokhwaCamera
// ---------------------------------------------------------------------------

/// [`CameraProvider`] for a native camera selected by index.
#[derive(Debug, Clone, Copy)]
pub struct NokhwaCamera {
    index: u32,
}

impl NokhwaCamera {
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    fn open_camera(&self) -> Result<Camera, CameraError> {
        let index = CameraIndex::Index(self.index);

        let preferred = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(640, 480),
        ));

        match Camera::new(index.clone(), preferred) {
            Ok(c) => Ok(c),
            Err(e) => {
                log::warn!("gesture: camera rejected 640x480 request: {e}");
                let any = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                Camera::new(index, any).map_err(|e| CameraError::Open {
                    index: self.index,
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl CameraProvider for NokhwaCamera {
    fn open(&self) -> Result<Box<dyn FrameSource>, CameraError> {
        let mut camera = self.open_camera()?;
        camera
            .open_stream()
            .map_err(|e| CameraError::Stream(e.to_string()))?;

        log::info!(
            "gesture: camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        Ok(Box::new(NokhwaSource { camera }))
    }
}

struct NokhwaSource {
    camera: Camera,
}

impl FrameSource for NokhwaSource {
    fn read_frame(&mut self) -> Result<Frame, FrameError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| FrameError::Capture(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| FrameError::Decode(e.to_string()))?;

        Ok(Frame {
            width: image.width(),
            height: image.height(),
            rgb: image.into_raw(),
        })
    }
}

impl Drop for NokhwaSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("gesture: failed to stop camera stream: {e}");
        }
        log::info!("gesture: camera released");
    }
}
