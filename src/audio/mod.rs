//! Audio input: microphone capture → 16 kHz mono → utterance detection.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → to_mono_16k
//!           → UtteranceDetector → Utterance
//! ```

pub mod capture;
pub mod resample;
pub mod vad;
pub mod wav;

/// Sample rate every consumer of captured audio works at.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

pub use capture::{AudioChunk, CpalMicrophone, ListenError, Microphone, StreamHandle, Utterance};
pub use resample::{downmix, resample, to_mono_16k};
pub use vad::{DetectorStatus, ListenParams, UtteranceDetector};
pub use wav::encode_wav_pcm16;
