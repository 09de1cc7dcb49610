//! Sample rate conversion
//!
//! Backends disagree on output rates (22.05, 24, 44.1 kHz); every
//! buffer entering concatenation must share one rate. Sinc
//! interpolation via rubato keeps the joins clean.

use anyhow::{Context, Result};
use rubato::{
    calculate_cutoff, Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

/// Resample a mono buffer from one rate to another
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let sinc_len = 256;
    let window = WindowFunction::BlackmanHarris2;
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff: calculate_cutoff(sinc_len, window),
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        samples.len(),
        1,
    )
    .context("failed to construct resampler")?;

    let output = resampler
        .process(&[samples.to_vec()], None)
        .context("resampling failed")?;

    Ok(output.into_iter().next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, seconds: f32) -> Vec<f32> {
        let n = (rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_same_rate_is_identity() {
        let samples = sine(22050, 0.1);
        let out = resample(&samples, 22050, 22050).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn test_empty_input() {
        assert!(resample(&[], 22050, 44100).unwrap().is_empty());
    }

    #[test]
    fn test_upsample_doubles_length_approximately() {
        let samples = sine(22050, 0.25);
        let out = resample(&samples, 22050, 44100).unwrap();
        let expected = samples.len() * 2;
        let tolerance = expected / 10;
        assert!(out.len().abs_diff(expected) < tolerance);
    }

    #[test]
    fn test_downsample_halves_length_approximately() {
        let samples = sine(44100, 0.25);
        let out = resample(&samples, 44100, 22050).unwrap();
        let expected = samples.len() / 2;
        let tolerance = expected / 10;
        assert!(out.len().abs_diff(expected) < tolerance);
    }
}
