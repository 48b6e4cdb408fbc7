//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to worker
//! threads.  Every section is `#[serde(default)]`, so a partial
//! `settings.toml` only overrides the keys it names.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::state::Viewport;
use crate::voice::Vocabulary;

// ---------------------------------------------------------------------------
// DisplayConfig
// ---------------------------------------------------------------------------

/// Canvas, sprite and render-loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Canvas width in points.
    pub width: u32,
    /// Canvas height in points.
    pub height: u32,
    /// Sprite edge length; both poses are scaled to a square of this size.
    pub sprite_size: u32,
    /// Render ticks per second.
    pub fps: u32,
    /// Bitmap for the idle pose.
    pub normal_sprite: PathBuf,
    /// Bitmap for the alternate dancing pose.
    pub dancing_sprite: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            sprite_size: 80,
            fps: 60,
            normal_sprite: PathBuf::from("mono_norm.png"),
            dancing_sprite: PathBuf::from("mono_inv.PNG"),
        }
    }
}

impl DisplayConfig {
    /// Canvas plus square sprite, for clamping.
    pub fn viewport(&self) -> Viewport {
        let side = self.sprite_size as i32;
        Viewport::new(self.width as i32, self.height as i32, side, side)
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Speech worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Pixels moved per directional command.
    pub step: i32,
    /// Language tag passed to the recognizer (ISO-639-1, e.g. `"es"`).
    pub language: String,
    /// Seconds to wait for speech to start before giving up on a listen.
    pub listen_timeout_secs: f32,
    /// Maximum length of a single phrase in seconds.
    pub phrase_limit_secs: f32,
    /// Seconds of audio used to estimate ambient noise before each listen.
    pub calibration_secs: f32,
    /// Seconds of trailing silence that end a phrase early.
    pub pause_secs: f32,
    /// Lower bound for the speech energy threshold (RMS).
    pub min_energy_threshold: f32,
    /// Keyword table mapping recognized text to commands.
    pub vocabulary: Vocabulary,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            step: 15,
            language: "es".into(),
            listen_timeout_secs: 3.0,
            phrase_limit_secs: 2.0,
            calibration_secs: 0.3,
            pause_secs: 0.8,
            min_energy_threshold: 0.01,
            vocabulary: Vocabulary::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecognizerProvider / RecognizerConfig
// ---------------------------------------------------------------------------

/// Selects which speech recognizer backend turns audio into text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RecognizerProvider {
    /// Any OpenAI-compatible `/v1/audio/transcriptions` endpoint.
    Api,
    /// Local Whisper model via `whisper-rs`.
    Whisper,
}

impl Default for RecognizerProvider {
    fn default() -> Self {
        Self::Api
    }
}

/// Settings for the speech recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Which backend to use.
    pub provider: RecognizerProvider,
    /// Base URL of the transcription API.
    pub base_url: String,
    /// API key; `None` for local servers that need no authentication.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"whisper-1"`).
    pub model: String,
    /// Maximum seconds to wait for a transcription response.
    pub timeout_secs: u64,
    /// GGML model file for the local provider.  `None` means
    /// `<models dir>/ggml-base.bin`.
    pub whisper_model: Option<PathBuf>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            provider: RecognizerProvider::default(),
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "whisper-1".into(),
            timeout_secs: 10,
            whisper_model: None,
        }
    }
}

impl RecognizerConfig {
    /// Resolved path of the local Whisper model.
    pub fn whisper_model_path(&self, paths: &AppPaths) -> PathBuf {
        self.whisper_model
            .clone()
            .unwrap_or_else(|| paths.models_dir.join("ggml-base.bin"))
    }
}

// ---------------------------------------------------------------------------
// GestureConfig
// ---------------------------------------------------------------------------

/// Camera and hand-landmark settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Camera device index (`0` = system default).
    pub camera_index: u32,
    /// ONNX hand-landmark model.  `None` means
    /// `<models dir>/hand_landmark.onnx`.
    pub landmark_model: Option<PathBuf>,
    /// Minimum hand-presence score for a detection to count.
    pub presence_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            landmark_model: None,
            presence_threshold: 0.5,
        }
    }
}

impl GestureConfig {
    /// Resolved path of the landmark model.
    pub fn landmark_model_path(&self, paths: &AppPaths) -> PathBuf {
        self.landmark_model
            .clone()
            .unwrap_or_else(|| paths.models_dir.join("hand_landmark.onnx"))
    }
}

// ---------------------------------------------------------------------------
// FeedbackConfig
// ---------------------------------------------------------------------------

/// Spoken feedback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Speak announcements at all.  When `false` they are only logged.
    pub enabled: bool,
    /// Speech synthesizer executable (espeak-compatible command line).
    pub program: String,
    /// Synthesizer voice name.
    pub voice: String,
    /// Speaking rate in words per minute.
    pub rate: u32,
    /// Volume, `1.0` = normal.
    pub volume: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "espeak-ng".into(),
            voice: "es".into(),
            rate: 150,
            volume: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use puppet_control::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.display.fps, 60);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub voice: VoiceConfig,
    pub recognizer: RecognizerConfig,
    pub gesture: GestureConfig,
    pub feedback: FeedbackConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_display_matches_default_viewport() {
        assert_eq!(DisplayConfig::default().viewport(), Viewport::default());
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.display.width, 800);
        assert_eq!(config.voice.step, 15);
        assert_eq!(config.recognizer.provider, RecognizerProvider::Api);
    }

    #[test]
    fn defaults_cover_every_section() {
        let cfg = AppConfig::default();

        assert_eq!((cfg.display.width, cfg.display.height), (800, 600));
        assert_eq!(cfg.display.sprite_size, 80);
        assert_eq!(cfg.display.fps, 60);
        assert_eq!(cfg.voice.language, "es");
        assert!((cfg.voice.listen_timeout_secs - 3.0).abs() < f32::EPSILON);
        assert!((cfg.voice.phrase_limit_secs - 2.0).abs() < f32::EPSILON);
        assert_eq!(cfg.feedback.rate, 150);
        assert!((cfg.feedback.volume - 1.0).abs() < f32::EPSILON);
        assert_eq!(cfg.gesture.camera_index, 0);
        assert!(cfg.recognizer.api_key.is_none());
    }

    #[test]
    fn modified_values_survive_round_trip() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.voice.step = 25;
        cfg.voice.language = "en".into();
        cfg.recognizer.provider = RecognizerProvider::Whisper;
        cfg.recognizer.api_key = Some("sk-test".into());
        cfg.recognizer.whisper_model = Some(PathBuf::from("/models/ggml-small.bin"));
        cfg.gesture.camera_index = 2;
        cfg.feedback.enabled = false;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.voice.step, 25);
        assert_eq!(loaded.voice.language, "en");
        assert_eq!(loaded.recognizer.provider, RecognizerProvider::Whisper);
        assert_eq!(loaded.recognizer.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            loaded.recognizer.whisper_model,
            Some(PathBuf::from("/models/ggml-small.bin"))
        );
        assert_eq!(loaded.gesture.camera_index, 2);
        assert!(!loaded.feedback.enabled);
        assert_eq!(loaded.voice.vocabulary, cfg.voice.vocabulary);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[voice]\nstep = 40\n").expect("write");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.voice.step, 40);
        assert_eq!(loaded.voice.language, "es");
        assert_eq!(loaded.display.fps, 60);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[voice\nstep = ").expect("write");

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn model_paths_default_into_models_dir() {
        let paths = AppPaths::new();
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.gesture.landmark_model_path(&paths),
            paths.models_dir.join("hand_landmark.onnx")
        );
        assert_eq!(
            cfg.recognizer.whisper_model_path(&paths),
            paths.models_dir.join("ggml-base.bin")
        );
    }
}
