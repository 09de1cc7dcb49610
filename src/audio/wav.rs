//! PCM buffers and WAV byte-level conversion
//!
//! Backends return whole WAV files; the stitcher works on normalized
//! f32 mono buffers. This module converts between the two.

use std::io::Cursor;

use crate::core::error::{Result, TtsError};

/// A decoded mono PCM buffer, owned by one synthesis request
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Samples normalized to [-1, 1]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count after decode (always 1; kept for status payloads)
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Playback length in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.samples.len() as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Decode a complete WAV file, downmixing multi-channel to mono
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
            TtsError::StitchFailure {
                message: format!("WAV header decode failed: {e}"),
            }
        })?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| TtsError::StitchFailure {
                    message: format!("WAV sample decode failed: {e}"),
                })?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| TtsError::StitchFailure {
                        message: format!("WAV sample decode failed: {e}"),
                    })?
            }
        };

        let samples = if spec.channels <= 1 {
            interleaved
        } else {
            let n = spec.channels as usize;
            interleaved
                .chunks(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        };

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Encode as a standard 16-bit PCM mono WAV file
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).map_err(|e| {
                TtsError::StitchFailure {
                    message: format!("WAV encode failed: {e}"),
                }
            })?;
            for &sample in &self.samples {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer
                    .write_sample(scaled)
                    .map_err(|e| TtsError::StitchFailure {
                        message: format!("WAV encode failed: {e}"),
                    })?;
            }
            writer.finalize().map_err(|e| TtsError::StitchFailure {
                message: format!("WAV finalize failed: {e}"),
            })?;
        }
        Ok(bytes)
    }

    /// Interpret raw little-endian 16-bit PCM as a buffer
    pub fn from_pcm16le(raw: &[u8], sample_rate: u32) -> Self {
        let samples = raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect();
        Self::new(samples, sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_round_trip() {
        let samples: Vec<f32> = (0..2205)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 22050.0).sin() * 0.5)
            .collect();
        let buffer = AudioBuffer::new(samples.clone(), 22050);

        let bytes = buffer.to_wav_bytes().unwrap();
        let decoded = AudioBuffer::from_wav_bytes(&bytes).unwrap();

        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.samples.len(), samples.len());
        for (a, b) in decoded.samples.iter().zip(&samples) {
            assert!((a - b).abs() < 1.0 / 32000.0);
        }
    }

    #[test]
    fn test_wav_header_is_44_bytes() {
        let buffer = AudioBuffer::new(vec![0.0; 100], 24000);
        let bytes = buffer.to_wav_bytes().unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(bytes.len(), 44 + 200);
    }

    #[test]
    fn test_stereo_downmix() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(16000i16).unwrap();
                writer.write_sample(-16000i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let decoded = AudioBuffer::from_wav_bytes(&bytes).unwrap();
        assert_eq!(decoded.samples.len(), 100);
        for s in &decoded.samples {
            assert!(s.abs() < 1e-6);
        }
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        let err = AudioBuffer::from_wav_bytes(b"not a wav file").unwrap_err();
        assert!(matches!(err, TtsError::StitchFailure { .. }));
    }

    #[test]
    fn test_pcm16le_decode() {
        let raw = [0x00, 0x40, 0x00, 0xC0]; // +0.5, -0.5
        let buffer = AudioBuffer::from_pcm16le(&raw, 24000);
        assert_eq!(buffer.samples.len(), 2);
        assert!((buffer.samples[0] - 0.5).abs() < 1e-3);
        assert!((buffer.samples[1] + 0.5).abs() < 1e-3);
    }
}
