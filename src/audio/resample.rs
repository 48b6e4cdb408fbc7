//! Conversion of raw device audio to the 16 kHz mono `f32` that the
//! utterance detector and the recognizers expect.

use super::TARGET_SAMPLE_RATE;

/// Average interleaved channels down to one.
///
/// ```rust
/// use puppet_control::audio::downmix;
///
/// let stereo = [0.5_f32, 0.25, -0.25, -0.5];
/// assert_eq!(downmix(&stereo, 2), vec![0.375, -0.375]);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let n = usize::from(channels);
    if n <= 1 {
        return if n == 1 { samples.to_vec() } else { Vec::new() };
    }
    samples
        .chunks_exact(n)
        .map(|frame| frame.iter().sum::<f32>() / n as f32)
        .collect()
}

/// Linear-interpolation resampler to [`TARGET_SAMPLE_RATE`].
///
/// Returns the input unchanged when it is already at the target rate.
pub fn resample(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == TARGET_SAMPLE_RATE || samples.is_empty() || source_rate == 0 {
        return samples.to_vec();
    }

    let step = f64::from(source_rate) / f64::from(TARGET_SAMPLE_RATE);
    let out_len = (samples.len() as f64 / step).floor() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(last)];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

/// Downmix then resample one chunk of device audio.
pub fn to_mono_16k(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<f32> {
    resample(&downmix(samples, channels), sample_rate)
}
