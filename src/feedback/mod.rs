//! Spoken feedback.
//!
//! [`Announcer::say`] hands a phrase to a [`Speaker`] on a detached thread
//! and returns immediately, so neither the controller nor a worker ever
//! blocks on speech synthesis.  Overlapping announcements may interleave;
//! no ordering is promised.
//!
//! [`CommandSpeaker`] drives an espeak-compatible synthesizer binary.
//! [`SilentSpeaker`] is used when feedback is disabled in the config.

use std::process::{Command, Stdio};
use std::sync::Arc;

use thiserror::Error;

use crate::config::FeedbackConfig;

/// Fixed announcement phrases.
pub mod phrases {
    pub const DANCING: &str = "¡Bailando!";
    pub const STOP_DANCING: &str = "Dejo de bailar";
    pub const VOICE_MODE: &str = "Modo voz activado";
    pub const CAMERA_MODE: &str = "Modo cámara activado";
}

// ---------------------------------------------------------------------------
// SpeakError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SpeakError {
    #[error("failed to launch speech synthesizer `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("speech synthesizer exited with {0}")]
    Failed(std::process::ExitStatus),
}

// ---------------------------------------------------------------------------
// Speaker trait
// ---------------------------------------------------------------------------

/// Blocking text-to-speech sink.  `speak` returns once the phrase has been
/// played (or has failed).
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), SpeakError>;
}

// ---------------------------------------------------------------------------
// Announcer
// ---------------------------------------------------------------------------

/// Fire-and-forget front end for a [`Speaker`].  Cheap to clone.
#[derive(Clone)]
pub struct Announcer {
    speaker: Arc<dyn Speaker>,
}

impl Announcer {
    pub fn new(speaker: Arc<dyn Speaker>) -> Self {
        Self { speaker }
    }

    /// Build the announcer described by `config`.
    pub fn from_config(config: &FeedbackConfig) -> Self {
        if config.enabled {
            Self::new(Arc::new(CommandSpeaker::from_config(config)))
        } else {
            Self::new(Arc::new(SilentSpeaker))
        }
    }

    /// Speak `phrase` on a background thread.  Never blocks; failures are
    /// logged and dropped.
    pub fn say(&self, phrase: &str) {
        log::info!("speak: {phrase}");

        let speaker = Arc::clone(&self.speaker);
        let text = phrase.to_owned();
        let spawned = std::thread::Builder::new()
            .name("speak".into())
            .spawn(move || {
                if let Err(e) = speaker.speak(&text) {
                    log::warn!("speech feedback failed: {e}");
                }
            });

        if let Err(e) = spawned {
            log::warn!("could not start speech thread: {e}");
        }
    }
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// CommandSpeaker
// ---------------------------------------------------------------------------

/// Runs `<program> -v <voice> -s <rate> -a <amplitude> <text>`.
///
/// `amplitude` is `volume × 100`, the espeak scale where 100 is normal.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    voice: String,
    rate: u32,
    volume: f32,
}

impl CommandSpeaker {
    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self {
            program: config.program.clone(),
            voice: config.voice.clone(),
            rate: config.rate,
            volume: config.volume,
        }
    }

    /// Argument list passed to the synthesizer for `text`.
    pub fn args(&self, text: &str) -> Vec<String> {
        let amplitude = (self.volume.max(0.0) * 100.0).round() as u32;
        vec![
            "-v".into(),
            self.voice.clone(),
            "-s".into(),
            self.rate.to_string(),
            "-a".into(),
            amplitude.to_string(),
            text.into(),
        ]
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) -> Result<(), SpeakError> {
        let status = Command::new(&self.program)
            .args(self.args(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| SpeakError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SpeakError::Failed(status))
        }
    }
}

// ---------------------------------------------------------------------------
// SilentSpeaker
// ---------------------------------------------------------------------------

/// Discards every phrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, _text: &str) -> Result<(), SpeakError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
