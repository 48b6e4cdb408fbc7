//! Core recognizer trait and shared helpers.
//!
//! [`SpeechRecognizer`] is the interface the voice worker calls.  It is
//! async, object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SpeechRecognizer>`.

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// RecognizeError
// ---------------------------------------------------------------------------

/// All errors that can arise from a recognition attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognizeError {
    /// Audio was captured but contained nothing intelligible.
    #[error("speech not understood")]
    NoMatch,

    /// The backend did not answer within the configured timeout.
    #[error("recognition request timed out")]
    Timeout,

    /// Transport, decoding or model failure.
    #[error("recognition service error: {0}")]
    Service(String),
}

impl From<reqwest::Error> for RecognizeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RecognizeError::Timeout
        } else {
            RecognizeError::Service(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Turns a captured phrase into text.
///
/// # Contract
///
/// - `audio` is **16 kHz, mono, f32** PCM.
/// - `language` is an ISO-639-1 tag such as `"es"`.
/// - On success the text is trimmed and lower-cased (see
///   [`normalize_transcript`]).
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, audio: &[f32], language: &str) -> Result<String, RecognizeError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

/// Trim and lower-case a raw transcript.
///
/// Empty output, or output consisting only of bracketed annotations such as
/// `[BLANK_AUDIO]` or `(music)`, is treated as [`RecognizeError::NoMatch`].
pub fn normalize_transcript(raw: &str) -> Result<String, RecognizeError> {
    let text = raw.trim();

    let only_annotations = text
        .split_whitespace()
        .all(|w| (w.starts_with('[') && w.ends_with(']')) || (w.starts_with('(') && w.ends_with(')')));

    if text.is_empty() || only_annotations {
        return Err(RecognizeError::NoMatch);
    }
    Ok(text.to_lowercase())
}

// ---------------------------------------------------------------------------
// UnavailableRecognizer
// ---------------------------------------------------------------------------

/// Fallback used when the configured backend could not be set up.  Every
/// call fails with an explanatory [`RecognizeError::Service`].
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    async fn recognize(&self, _audio: &[f32], _language: &str) -> Result<String, RecognizeError> {
        Err(RecognizeError::Service(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer (test only)
// ---------------------------------------------------------------------------

/// Replays a scripted sequence of results, then repeats the last one.
#[cfg(test)]
pub struct MockRecognizer {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, RecognizeError>>>,
    last: std::sync::Mutex<Result<String, RecognizeError>>,
}

#[cfg(test)]
impl MockRecognizer {
    pub fn new(script: Vec<Result<String, RecognizeError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            last: std::sync::Mutex::new(Err(RecognizeError::NoMatch)),
        }
    }

    pub fn always(text: &str) -> Self {
        let m = Self::new(Vec::new());
        *m.last.lock().unwrap() = Ok(text.to_owned());
        m
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn recognize(&self, _audio: &[f32], _language: &str) -> Result<String, RecognizeError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(r) => {
                *self.last.lock().unwrap() = r.clone();
                r
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_transcript("  Arriba. ").unwrap(), "arriba.");
    }

    #[test]
    fn empty_transcript_is_no_match() {
        assert_eq!(normalize_transcript("   "), Err(RecognizeError::NoMatch));
    }

    #[test]
    fn annotation_only_transcript_is_no_match() {
        assert_eq!(
            normalize_transcript("[BLANK_AUDIO]"),
            Err(RecognizeError::NoMatch)
        );
        assert_eq!(
            normalize_transcript(" (música) "),
            Err(RecognizeError::NoMatch)
        );
    }

    #[test]
    fn annotation_mixed_with_words_is_kept() {
        assert_eq!(
            normalize_transcript("[ruido] Bailar").unwrap(),
            "[ruido] bailar"
        );
    }

    #[tokio::test]
    async fn unavailable_recognizer_reports_reason() {
        let r = UnavailableRecognizer::new("model missing");
        assert_eq!(
            r.recognize(&[0.0; 16], "es").await,
            Err(RecognizeError::Service("model missing".into()))
        );
    }

    #[tokio::test]
    async fn mock_replays_script_then_repeats_last() {
        let m = MockRecognizer::new(vec![Ok("arriba".into()), Err(RecognizeError::Timeout)]);
        assert_eq!(m.recognize(&[], "es").await, Ok("arriba".into()));
        assert_eq!(m.recognize(&[], "es").await, Err(RecognizeError::Timeout));
        assert_eq!(m.recognize(&[], "es").await, Err(RecognizeError::Timeout));
    }
}
