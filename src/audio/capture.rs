//! Microphone capture via `cpal`.
//!
//! [`CpalMicrophone`] opens the default input device for the duration of one
//! [`Microphone::listen`] call, streams [`AudioChunk`]s over an mpsc channel
//! into an [`UtteranceDetector`], and closes the device again when the
//! phrase is complete.  The [`StreamHandle`] RAII guard owns the cpal stream,
//! so every exit path (phrase, timeout, error) releases the device.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::resample::to_mono_16k;
use super::vad::{DetectorStatus, ListenParams, UtteranceDetector};
use super::TARGET_SAMPLE_RATE;

/// How long one `recv` waits before the wall-clock guard is re-checked.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra wall-clock allowance over [`ListenParams::max_duration`] for a
/// device that delivers audio late.
pub const DEVICE_SLACK: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// AudioChunk / Utterance
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// One captured phrase: 16 kHz mono `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub samples: Vec<f32>,
}

impl Utterance {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(TARGET_SAMPLE_RATE))
    }
}

// ---------------------------------------------------------------------------
// ListenError
// ---------------------------------------------------------------------------

/// Errors from a single listen.
#[derive(Debug, Error)]
pub enum ListenError {
    /// Nobody spoke before the timeout.  Routine; the caller just listens
    /// again.
    #[error("no speech before the listen timeout")]
    WaitTimeout,

    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// The device stopped delivering audio.
    #[error("audio stream closed unexpectedly")]
    StreamClosed,
}

impl ListenError {
    /// `true` for the routine "nobody spoke" outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ListenError::WaitTimeout)
    }
}

// ---------------------------------------------------------------------------
// Microphone trait
// ---------------------------------------------------------------------------

/// Blocking source of spoken phrases.
///
/// `listen` blocks the calling thread for at most
/// [`ListenParams::max_duration`] plus [`DEVICE_SLACK`], i.e.
/// `calibration + timeout + phrase_limit + 1 s`.  Callers on an async runtime
/// must run it inside `spawn_blocking`.
pub trait Microphone: Send + Sync {
    fn listen(&self, params: &ListenParams) -> Result<Utterance, ListenError>;
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.  Dropping it stops capture.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CpalMicrophone
// ---------------------------------------------------------------------------

/// [`Microphone`] backed by the system default input device.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }

    /// Open the default input device and start streaming into `tx`.
    fn open(tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, ListenError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(ListenError::NoDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Receiver gone means the listen finished.
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }
}

impl Microphone for CpalMicrophone {
    fn listen(&self, params: &ListenParams) -> Result<Utterance, ListenError> {
        let (tx, rx) = mpsc::channel::<AudioChunk>();
        let _handle = Self::open(tx)?;

        let mut detector = UtteranceDetector::new(params);
        let deadline = Instant::now() + params.max_duration() + DEVICE_SLACK;

        loop {
            let status = match rx.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => {
                    detector.push(&to_mono_16k(&chunk.samples, chunk.sample_rate, chunk.channels))
                }
                Err(mpsc::RecvTimeoutError::Timeout) => DetectorStatus::Pending,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(ListenError::StreamClosed);
                }
            };

            match status {
                DetectorStatus::Complete(samples) => return Ok(Utterance { samples }),
                DetectorStatus::TimedOut => return Err(ListenError::WaitTimeout),
                DetectorStatus::Pending => {}
            }

            // A stalled device must not hold the worker past its limits.
            if Instant::now() >= deadline {
                return match detector.finish() {
                    DetectorStatus::Complete(samples) => Ok(Utterance { samples }),
                    _ => Err(ListenError::WaitTimeout),
                };
            }
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
    fn audio_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudioChunk>();
    }

    #[test]
    fn microphone_is_object_safe() {
        let _mic: Box<dyn Microphone> = Box::new(CpalMicrophone::new());
    }

    #[test]
    fn utterance_duration_at_16k() {
        let u = Utterance {
            samples: vec![0.0; 8_000],
        };
        assert_eq!(u.duration(), Duration::from_millis(500));
    }

    #[test]
    fn only_wait_timeout_is_routine() {
        assert!(ListenError::WaitTimeout.is_timeout());
        assert!(!ListenError::NoDevice.is_timeout());
        assert!(!ListenError::StreamClosed.is_timeout());
    }
}
