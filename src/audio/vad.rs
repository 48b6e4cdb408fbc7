//! Energy-based utterance detection for a single listen.
//!
//! [`UtteranceDetector`] consumes 16 kHz mono audio as it arrives and decides
//! when one phrase has been captured.
//!
//! ## Algorithm
//!
//! Audio is split into 30 ms frames (480 samples @ 16 kHz) and each frame's
//! RMS energy is computed.
//!
//! ```text
//! Calibrating ──(calibration window elapsed)──▶ Waiting
//!   threshold = max(min_threshold, ambient_rms × 1.5)
//!
//! Waiting ──(frame above threshold)──▶ Recording
//! Waiting ──(timeout elapsed)──────────▶ TimedOut
//!
//! Recording ──(phrase limit reached)────▶ Complete
//! Recording ──(trailing silence reached)▶ Complete
//! ```
//!
//! All durations are counted in samples, never wall-clock time, so the
//! detector is fully deterministic.

use std::time::Duration;

use super::TARGET_SAMPLE_RATE;

/// 30 ms at 16 kHz.
pub const FRAME_SIZE: usize = 480;

/// Ambient energy is scaled by this factor to get the speech threshold.
const AMBIENT_RATIO: f32 = 1.5;

// ---------------------------------------------------------------------------
// ListenParams
// ---------------------------------------------------------------------------

/// Timing limits for one listen.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenParams {
    /// Ambient-noise measurement before waiting for speech.
    pub calibration: Duration,
    /// How long to wait for speech to start.
    pub timeout: Duration,
    /// Hard cap on the length of the captured phrase.
    pub phrase_limit: Duration,
    /// Silence after speech that ends the phrase early.
    pub trailing_silence: Duration,
    /// Lower bound for the speech threshold (RMS).
    pub min_threshold: f32,
}

impl Default for ListenParams {
    fn default() -> Self {
        Self {
            calibration: Duration::from_millis(300),
            timeout: Duration::from_secs(3),
            phrase_limit: Duration::from_secs(2),
            trailing_silence: Duration::from_millis(800),
            min_threshold: 0.01,
        }
    }
}

impl ListenParams {
    /// Longest a listen can take when audio arrives on time: calibration,
    /// then the wait for speech, then a full phrase.
    pub fn max_duration(&self) -> Duration {
        self.calibration + self.timeout + self.phrase_limit
    }
}

impl From<&crate::config::VoiceConfig> for ListenParams {
    fn from(cfg: &crate::config::VoiceConfig) -> Self {
        Self {
            calibration: secs(cfg.calibration_secs),
            timeout: secs(cfg.listen_timeout_secs),
            phrase_limit: secs(cfg.phrase_limit_secs),
            trailing_silence: secs(cfg.pause_secs),
            min_threshold: cfg.min_energy_threshold,
        }
    }
}

fn frames_in(d: Duration) -> usize {
    let samples = d.as_micros() * u128::from(TARGET_SAMPLE_RATE) / 1_000_000;
    (samples as usize).div_ceil(FRAME_SIZE)
}

fn secs(value: f32) -> Duration {
    Duration::from_millis((value.max(0.0) * 1000.0).round() as u64)
}

/// RMS amplitude of `frame`; `0.0` for an empty slice.
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let mean_sq: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// DetectorStatus
// ---------------------------------------------------------------------------

/// Outcome after feeding audio to the detector.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorStatus {
    /// Keep feeding audio.
    Pending,
    /// A phrase was captured (16 kHz mono).
    Complete(Vec<f32>),
    /// No speech started within the timeout.
    TimedOut,
}

// ---------------------------------------------------------------------------
// UtteranceDetector
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Phase {
    Calibrating { energy_sum: f32, frames: usize },
    Waiting { frames: usize },
    Recording { silent_frames: usize },
    Done,
}

/// Streaming speech start/end detector.  See the module docs.
#[derive(Debug)]
pub struct UtteranceDetector {
    calibration_frames: usize,
    timeout_frames: usize,
    phrase_frames: usize,
    trailing_frames: usize,
    min_threshold: f32,
    threshold: f32,
    phase: Phase,
    /// Samples not yet forming a whole frame.
    carry: Vec<f32>,
    /// Captured phrase.
    phrase: Vec<f32>,
}

impl UtteranceDetector {
    pub fn new(params: &ListenParams) -> Self {
        let mut detector = Self {
            calibration_frames: frames_in(params.calibration),
            timeout_frames: frames_in(params.timeout).max(1),
            phrase_frames: frames_in(params.phrase_limit).max(1),
            trailing_frames: frames_in(params.trailing_silence).max(1),
            min_threshold: params.min_threshold,
            threshold: params.min_threshold,
            phase: Phase::Calibrating {
                energy_sum: 0.0,
                frames: 0,
            },
            carry: Vec::with_capacity(FRAME_SIZE),
            phrase: Vec::new(),
        };
        if detector.calibration_frames == 0 {
            detector.phase = Phase::Waiting { frames: 0 };
        }
        detector
    }

    /// Speech threshold in effect (final once calibration is over).
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed the next block of 16 kHz mono samples.
    ///
    /// Once a non-`Pending` status has been returned, further input is
    /// ignored and `Pending` is returned.
    pub fn push(&mut self, samples: &[f32]) -> DetectorStatus {
        self.carry.extend_from_slice(samples);

        let mut consumed = 0;
        while self.carry.len() - consumed >= FRAME_SIZE {
            let frame: Vec<f32> = self.carry[consumed..consumed + FRAME_SIZE].to_vec();
            consumed += FRAME_SIZE;

            let status = self.process_frame(&frame);
            if status != DetectorStatus::Pending {
                self.carry.clear();
                return status;
            }
        }
        self.carry.drain(..consumed);
        DetectorStatus::Pending
    }

    /// Stream ended early: return what was captured, if anything.
    pub fn finish(&mut self) -> DetectorStatus {
        match self.phase {
            Phase::Recording { .. } if !self.phrase.is_empty() => {
                self.phase = Phase::Done;
                DetectorStatus::Complete(std::mem::take(&mut self.phrase))
            }
            Phase::Done => DetectorStatus::Pending,
            _ => {
                self.phase = Phase::Done;
                DetectorStatus::TimedOut
            }
        }
    }

    fn process_frame(&mut self, frame: &[f32]) -> DetectorStatus {
        let energy = rms(frame);

        match &mut self.phase {
            Phase::Calibrating { energy_sum, frames } => {
                *energy_sum += energy;
                *frames += 1;
                if *frames >= self.calibration_frames {
                    let ambient = *energy_sum / *frames as f32;
                    self.threshold = self.min_threshold.max(ambient * AMBIENT_RATIO);
                    log::debug!(
                        "ambient rms {ambient:.4}, speech threshold {:.4}",
                        self.threshold
                    );
                    self.phase = Phase::Waiting { frames: 0 };
                }
                DetectorStatus::Pending
            }

            Phase::Waiting { frames } => {
                if energy > self.threshold {
                    self.phrase.extend_from_slice(frame);
                    self.phase = Phase::Recording { silent_frames: 0 };
                    return self.check_phrase_limit();
                }
                *frames += 1;
                if *frames >= self.timeout_frames {
                    self.phase = Phase::Done;
                    return DetectorStatus::TimedOut;
                }
                DetectorStatus::Pending
            }

            Phase::Recording { silent_frames } => {
                self.phrase.extend_from_slice(frame);
                if energy > self.threshold {
                    *silent_frames = 0;
                } else {
                    *silent_frames += 1;
                    if *silent_frames >= self.trailing_frames {
                        self.phase = Phase::Done;
                        return DetectorStatus::Complete(std::mem::take(&mut self.phrase));
                    }
                }
                self.check_phrase_limit()
            }

            Phase::Done => DetectorStatus::Pending,
        }
    }

    fn check_phrase_limit(&mut self) -> DetectorStatus {
        if self.phrase.len() >= self.phrase_frames * FRAME_SIZE {
            self.phase = Phase::Done;
            DetectorStatus::Complete(std::mem::take(&mut self.phrase))
        } else {
            DetectorStatus::Pending
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
    fn max_duration_covers_calibration_wait_and_phrase() {
        assert_eq!(
            ListenParams::default().max_duration(),
            Duration::from_millis(5300)
        );
    }

    fn frames(n: usize, level: f32) -> Vec<f32> {
        vec![level; n * FRAME_SIZE]
    }

    fn params() -> ListenParams {
        ListenParams {
            calibration: Duration::from_millis(90),      // 3 frames
            timeout: Duration::from_millis(300),         // 10 frames
            phrase_limit: Duration::from_millis(600),    // 20 frames
            trailing_silence: Duration::from_millis(90), // 3 frames
            min_threshold: 0.01,
        }
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((rms(&[0.5; 480]) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn silence_times_out() {
        let mut d = UtteranceDetector::new(&params());
        assert_eq!(d.push(&frames(3, 0.0)), DetectorStatus::Pending);
        assert_eq!(d.push(&frames(9, 0.0)), DetectorStatus::Pending);
        assert_eq!(d.push(&frames(1, 0.0)), DetectorStatus::TimedOut);
    }

    #[test]
    fn speech_followed_by_pause_completes() {
        let mut d = UtteranceDetector::new(&params());
        d.push(&frames(3, 0.0));
        assert_eq!(d.push(&frames(5, 0.5)), DetectorStatus::Pending);
        match d.push(&frames(3, 0.0)) {
            DetectorStatus::Complete(audio) => assert_eq!(audio.len(), 8 * FRAME_SIZE),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn phrase_limit_caps_long_speech() {
        let mut d = UtteranceDetector::new(&params());
        d.push(&frames(3, 0.0));
        match d.push(&frames(50, 0.5)) {
            DetectorStatus::Complete(audio) => assert_eq!(audio.len(), 20 * FRAME_SIZE),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn calibration_raises_threshold_above_ambient() {
        let mut d = UtteranceDetector::new(&params());
        d.push(&frames(3, 0.1));
        assert!((d.threshold() - 0.15).abs() < 1e-5);

        // Steady ambient noise is not speech.
        assert_eq!(d.push(&frames(5, 0.1)), DetectorStatus::Pending);
        // Louder input is.
        d.push(&frames(2, 0.5));
        assert!(matches!(d.push(&frames(3, 0.1)), DetectorStatus::Complete(_)));
    }

    #[test]
    fn quiet_room_uses_minimum_threshold() {
        let mut d = UtteranceDetector::new(&params());
        d.push(&frames(3, 0.0));
        assert!((d.threshold() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn partial_frames_are_carried_over() {
        let mut d = UtteranceDetector::new(&ListenParams {
            calibration: Duration::ZERO,
            ..params()
        });
        let loud = frames(1, 0.5);
        assert_eq!(d.push(&loud[..200]), DetectorStatus::Pending);
        assert_eq!(d.push(&loud[200..]), DetectorStatus::Pending);
        assert!(matches!(d.push(&frames(3, 0.0)), DetectorStatus::Complete(_)));
    }

    #[test]
    fn finish_returns_partial_phrase() {
        let mut d = UtteranceDetector::new(&params());
        d.push(&frames(3, 0.0));
        d.push(&frames(2, 0.5));
        assert!(matches!(d.finish(), DetectorStatus::Complete(a) if a.len() == 2 * FRAME_SIZE));
    }

    #[test]
    fn finish_without_speech_is_timeout() {
        let mut d = UtteranceDetector::new(&params());
        d.push(&frames(2, 0.0));
        assert_eq!(d.finish(), DetectorStatus::TimedOut);
    }

    #[test]
    fn default_params_match_voice_config() {
        let from_cfg = ListenParams::from(&crate::config::VoiceConfig::default());
        assert_eq!(from_cfg, ListenParams::default());
    }
}
