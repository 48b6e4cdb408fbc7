//! Local recognition with a GGML Whisper model via `whisper-rs`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::engine::{normalize_transcript, RecognizeError, SpeechRecognizer};

/// Shortest phrase worth sending to Whisper: 0.1 s at 16 kHz.
const MIN_AUDIO_SAMPLES: usize = 1_600;

/// [`SpeechRecognizer`] backed by a loaded Whisper model.
///
/// A fresh `WhisperState` is created per call, so one model can serve
/// calls from any thread.  Inference runs on tokio's blocking pool.
#[derive(Clone)]
pub struct WhisperRecognizer {
    ctx: Arc<WhisperContext>,
    n_threads: i32,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("n_threads", &self.n_threads)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; model
// weights are read-only after loading.
unsafe impl Send for WhisperRecognizer {}
unsafe impl Sync for WhisperRecognizer {}

impl WhisperRecognizer {
    /// Load a GGML model from `model_path`.
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, RecognizeError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(RecognizeError::Service(format!(
                "Whisper model not found: {}",
                path.display()
            )));
        }

        let path_str = path.to_str().ok_or_else(|| {
            RecognizeError::Service(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let n_threads = std::thread::available_parallelism()
            .map(|n| n.get().min(8) as i32)
            .unwrap_or(4);

        Ok(Self {
            ctx: Arc::new(ctx),
            n_threads,
        })
    }

    fn transcribe_blocking(&self, audio: &[f32], language: &str) -> Result<String, RecognizeError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(RecognizeError::NoMatch);
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_n_threads(self.n_threads);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_single_segment(true);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        state
            .full(params, audio)
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let n = state
            .full_n_segments()
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| RecognizeError::Service(e.to_string()))?;
            text.push_str(&segment);
        }

        normalize_transcript(&text)
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn recognize(&self, audio: &[f32], language: &str) -> Result<String, RecognizeError> {
        let this = self.clone();
        let audio = audio.to_vec();
        let language = language.to_owned();

        tokio::task::spawn_blocking(move || this.transcribe_blocking(&audio, &language))
            .await
            .map_err(|e| RecognizeError::Service(format!("whisper task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_a_service_error() {
        let err = WhisperRecognizer::load("/nonexistent/ggml-base.bin").unwrap_err();
        assert!(matches!(err, RecognizeError::Service(msg) if msg.contains("not found")));
    }

    #[test]
    fn recognizer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WhisperRecognizer>();
    }
}
