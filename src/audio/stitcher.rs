//! Chunk concatenation with equal-power crossfades
//!
//! Joins the per-chunk buffers of one request into a single seamless
//! buffer. All inputs are brought to the first buffer's sample rate
//! and peak-normalized to a common level before joining, so the seams
//! carry neither a rate glitch nor a level jump.

use crate::audio::{resampler, AudioBuffer};
use crate::core::error::{Result, TtsError};

/// Common peak target, −1 dBFS
const TARGET_PEAK: f32 = 0.891;

/// Concatenate buffers with an equal-power crossfade at every join
///
/// The crossfade window is clamped to a quarter of either neighbor so
/// very short chunks keep an audible body. With K buffers and window N
/// the output length is `sum(len) - (K-1) * N`.
pub fn stitch(buffers: Vec<AudioBuffer>, crossfade_ms: u32) -> Result<AudioBuffer> {
    let mut buffers = prepare(buffers)?;
    let sample_rate = buffers[0].sample_rate;

    let first = buffers.remove(0);
    let mut prev_len = first.samples.len();
    let mut out = first.samples;

    for buffer in buffers {
        let requested = (crossfade_ms as usize * sample_rate as usize) / 1000;
        let window = requested.min(prev_len / 4).min(buffer.samples.len() / 4);
        crossfade_join(&mut out, &buffer.samples, window);
        prev_len = buffer.samples.len();
    }

    Ok(AudioBuffer::new(out, sample_rate))
}

/// Concatenate buffers with silent gaps instead of crossfades
///
/// Used for dialogue-style joins where a pause belongs between turns.
pub fn stitch_with_gaps(buffers: Vec<AudioBuffer>, gap_ms: u32) -> Result<AudioBuffer> {
    let mut buffers = prepare(buffers)?;
    let sample_rate = buffers[0].sample_rate;
    let gap = vec![0.0f32; (gap_ms as usize * sample_rate as usize) / 1000];

    let mut out = buffers.remove(0).samples;
    for buffer in buffers {
        out.extend_from_slice(&gap);
        out.extend_from_slice(&buffer.samples);
    }

    Ok(AudioBuffer::new(out, sample_rate))
}

/// Resample everything to the first buffer's rate and level the peaks
fn prepare(buffers: Vec<AudioBuffer>) -> Result<Vec<AudioBuffer>> {
    if buffers.is_empty() {
        return Err(TtsError::StitchFailure {
            message: "no audio buffers to stitch".to_string(),
        });
    }

    let target_rate = buffers[0].sample_rate;
    let mut prepared = Vec::with_capacity(buffers.len());
    for buffer in buffers {
        let mut buffer = if buffer.sample_rate == target_rate {
            buffer
        } else {
            let samples = resampler::resample(&buffer.samples, buffer.sample_rate, target_rate)
                .map_err(|e| TtsError::StitchFailure {
                    message: format!(
                        "resampling {} Hz to {} Hz failed: {e}",
                        buffer.sample_rate, target_rate
                    ),
                })?;
            AudioBuffer::new(samples, target_rate)
        };
        normalize_peak(&mut buffer);
        prepared.push(buffer);
    }
    Ok(prepared)
}

/// Scale a buffer so its absolute peak sits at the common target
fn normalize_peak(buffer: &mut AudioBuffer) {
    let peak = buffer.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak == 0.0 {
        return;
    }
    let gain = TARGET_PEAK / peak;
    for sample in &mut buffer.samples {
        *sample *= gain;
    }
}

/// Mix `next` onto the tail of `out` over a `window`-sample overlap
///
/// Gains follow sine/cosine curves whose squares sum to one, keeping
/// perceived loudness constant through the join.
fn crossfade_join(out: &mut Vec<f32>, next: &[f32], window: usize) {
    if window == 0 || next.len() < window {
        out.extend_from_slice(next);
        return;
    }

    let tail = out.len() - window;
    for i in 0..window {
        let theta = (i as f32 / window as f32) * std::f32::consts::FRAC_PI_2;
        out[tail + i] = out[tail + i] * theta.cos() + next[i] * theta.sin();
    }
    out.extend_from_slice(&next[window..]);
}
