//! Hand-landmark detection.
//!
//! [`OnnxHandDetector`] runs a single-hand landmark model through ONNX
//! Runtime.  The model takes a `1×224×224×3` NHWC float image in `[0, 1]`
//! and produces 21 `(x, y, z)` landmarks in input-pixel units plus a
//! hand-presence score.

use std::path::Path;

use ndarray::Array4;
use thiserror::Error;

use super::camera::Frame;
use super::landmarks::{HandLandmarks, LANDMARK_COUNT};

/// Model input edge length in pixels.
const INPUT_SIZE: u32 = 224;

// ---------------------------------------------------------------------------
// DetectError / HandDetector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    /// No usable model; detection will never succeed.
    #[error("hand detector unavailable: {0}")]
    Unavailable(String),

    /// A single inference failed.
    #[error("hand detection failed: {0}")]
    Inference(String),
}

/// RGB frame → at most one hand.
pub trait HandDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandLandmarks>, DetectError>;
}

// ---------------------------------------------------------------------------
// UnavailableDetector
// ---------------------------------------------------------------------------

/// Stand-in when the model could not be loaded.
#[derive(Debug, Clone)]
pub struct UnavailableDetector {
    reason: String,
}

impl UnavailableDetector {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl HandDetector for UnavailableDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<HandLandmarks>, DetectError> {
        Err(DetectError::Unavailable(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// OnnxHandDetector
// ---------------------------------------------------------------------------

pub struct OnnxHandDetector {
    session: ort::session::Session,
    presence_threshold: f32,
}

impl OnnxHandDetector {
    /// Load the landmark model at `model_path`.
    pub fn load(model_path: &Path, presence_threshold: f32) -> Result<Self, DetectError> {
        if !model_path.exists() {
            return Err(DetectError::Unavailable(format!(
                "landmark model not found: {}",
                model_path.display()
            )));
        }

        ort::init()
            .with_name("puppet-control")
            .commit()
            .map_err(|e| DetectError::Unavailable(format!("failed to initialize ORT: {e}")))?;

        let session = ort::session::Session::builder()
            .map_err(|e| DetectError::Unavailable(format!("failed to create session builder: {e}")))?
            .with_intra_threads(2)
            .map_err(|e| DetectError::Unavailable(format!("failed to set threads: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| DetectError::Unavailable(format!("failed to load landmark model: {e}")))?;

        log::info!("gesture: loaded landmark model from {}", model_path.display());

        Ok(Self {
            session,
            presence_threshold,
        })
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandLandmarks>, DetectError> {
        let input = preprocess_nhwc(frame, INPUT_SIZE);
        let array = Array4::from_shape_vec((1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3), input)
            .map_err(|e| DetectError::Inference(format!("failed to create input array: {e}")))?;
        let tensor = ort::value::Tensor::from_array(array)
            .map_err(|e| DetectError::Inference(format!("failed to create tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let mut landmarks: Option<Vec<f32>> = None;
        let mut presence: Option<f32> = None;

        for (_name, value) in outputs.iter() {
            let Ok((_shape, data)) = value.try_extract_tensor::<f32>() else {
                continue;
            };
            if landmarks.is_none() && data.len() == LANDMARK_COUNT * 3 {
                landmarks = Some(data.to_vec());
            } else if presence.is_none() && data.len() == 1 {
                presence = Some(data[0]);
            }
        }

        let raw = landmarks
            .ok_or_else(|| DetectError::Inference("model produced no landmark tensor".into()))?;

        Ok(decode_hand(&raw, presence, self.presence_threshold))
    }
}

/// Turn raw model output into a hand, or `None` when presence is too low.
///
/// Coordinates are divided by the input size to normalize them.  A presence
/// value outside `[0, 1]` is treated as a logit.
fn decode_hand(raw: &[f32], presence: Option<f32>, threshold: f32) -> Option<HandLandmarks> {
    if let Some(p) = presence {
        let score = if (0.0..=1.0).contains(&p) {
            p
        } else {
            1.0 / (1.0 + (-p).exp())
        };
        if score < threshold {
            return None;
        }
    }

    let scale = INPUT_SIZE as f32;
    let normalized: Vec<f32> = raw.iter().map(|v| v / scale).collect();
    HandLandmarks::from_flat(&normalized)
}

/// Nearest-neighbour resize to `size × size`, RGB in `[0, 1]`, NHWC order.
fn preprocess_nhwc(frame: &Frame, size: u32) -> Vec<f32> {
    let mut out = Vec::with_capacity((size * size * 3) as usize);
    if frame.width == 0 || frame.height == 0 {
        out.resize((size * size * 3) as usize, 0.0);
        return out;
    }

    let x_ratio = frame.width as f32 / size as f32;
    let y_ratio = frame.height as f32 / size as f32;

    for y in 0..size {
        let src_y = ((y as f32 * y_ratio) as u32).min(frame.height - 1);
        for x in 0..size {
            let src_x = ((x as f32 * x_ratio) as u32).min(frame.width - 1);
            for c in frame.pixel(src_x, src_y) {
                out.push(f32::from(c) / 255.0);
            }
        }
    }
    out
}
