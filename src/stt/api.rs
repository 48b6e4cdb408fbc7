//! `ApiRecognizer` calls any OpenAI-compatible
//! `/v1/audio/transcriptions` endpoint (OpenAI, Groq, a local
//! whisper.cpp server, …).  All connection details come from
//! [`RecognizerConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::audio::encode_wav_pcm16;
use crate::config::RecognizerConfig;

use super::engine::{normalize_transcript, RecognizeError, SpeechRecognizer};

pub struct ApiRecognizer {
    client: reqwest::Client,
    config: RecognizerConfig,
}

impl ApiRecognizer {
    /// Build an `ApiRecognizer` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SpeechRecognizer for ApiRecognizer {
    /// Upload the phrase as a WAV file and return the normalised text.
    ///
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn recognize(&self, audio: &[f32], language: &str) -> Result<String, RecognizeError> {
        let file = Part::bytes(encode_wav_pcm16(audio))
            .file_name("phrase.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("language", language.to_owned())
            .text("response_format", "json");

        let mut req = self.client.post(self.endpoint()).multipart(form);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RecognizeError::Service(format!("HTTP {status}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RecognizeError::Service(format!("bad response body: {e}")))?;

        let text = json["text"]
            .as_str()
            .ok_or_else(|| RecognizeError::Service("response has no `text` field".into()))?;

        normalize_transcript(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
