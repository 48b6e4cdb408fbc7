//! Gesture control: the index fingertip drags the character, a raised thumb
//! makes it dance.
//!
//! # Architecture
//!
//! ```text
//! CameraProvider ──open──▶ FrameSource ──Frame──▶ mirror
//!                                                   │
//!                         HandDetector (ONNX) ◀─────┘
//!                                │ HandLandmarks
//!                                ▼
//!                          read_gesture ──▶ SharedCharacter
//! ```

pub mod camera;
pub mod detector;
pub mod landmarks;
pub mod worker;

use std::path::Path;
use std::sync::{Arc, Mutex};

pub use camera::{CameraError, CameraProvider, Frame, FrameError, FrameSource, NokhwaCamera};
pub use detector::{DetectError, HandDetector, OnnxHandDetector, UnavailableDetector};
pub use landmarks::{read_gesture, GestureReading, HandLandmarks, HandPoint, Landmark};
pub use worker::{FrameOutcome, GestureWorker, SharedDetector};

/// Load the landmark model, degrading to [`UnavailableDetector`] when it
/// cannot be loaded.
pub fn build_detector(model_path: &Path, presence_threshold: f32) -> SharedDetector {
    let detector: Box<dyn HandDetector> =
        match OnnxHandDetector::load(model_path, presence_threshold) {
            Ok(d) => Box::new(d),
            Err(e) => {
                log::warn!("gesture: {e}. Gesture mode will not track hands.");
                Box::new(UnavailableDetector::new(e.to_string()))
            }
        };
    Arc::new(Mutex::new(detector))
}
