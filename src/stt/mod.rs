//! Speech recognition: captured phrase → lower-cased text.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │          SpeechRecognizer (async trait)        │
//! │                                               │
//! │   ┌──────────────┐     ┌───────────────────┐  │
//! │   │ ApiRecognizer│     │ WhisperRecognizer │  │
//! │   │ WAV upload   │     │ local GGML model  │  │
//! │   └──────────────┘     └───────────────────┘  │
//! │                                               │
//! │   UnavailableRecognizer  (setup failed)       │
//! └───────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod engine;
pub mod whisper;

use std::sync::Arc;

pub use api::ApiRecognizer;
pub use engine::{normalize_transcript, RecognizeError, SpeechRecognizer, UnavailableRecognizer};
pub use whisper::WhisperRecognizer;

#[cfg(test)]
pub use engine::MockRecognizer;

use crate::config::{AppPaths, RecognizerConfig, RecognizerProvider};

/// Build the recognizer selected by `config`, degrading to
/// [`UnavailableRecognizer`] when a local model cannot be loaded.
pub fn build_recognizer(config: &RecognizerConfig, paths: &AppPaths) -> Arc<dyn SpeechRecognizer> {
    match config.provider {
        RecognizerProvider::Api => {
            log::info!("speech recognizer: API at {}", config.base_url);
            Arc::new(ApiRecognizer::from_config(config))
        }
        RecognizerProvider::Whisper => {
            let path = config.whisper_model_path(paths);
            match WhisperRecognizer::load(&path) {
                Ok(r) => {
                    log::info!("Whisper model loaded: {}", path.display());
                    Arc::new(r)
                }
                Err(e) => {
                    log::warn!(
                        "Could not load Whisper model ({}): {e}. Voice control will not understand speech.",
                        path.display()
                    );
                    Arc::new(UnavailableRecognizer::new(e.to_string()))
                }
            }
        }
    }
}
