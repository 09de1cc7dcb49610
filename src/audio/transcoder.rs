//! Final-format transcoding through ffmpeg
//!
//! Lossy containers are produced by an external encoder process with
//! both ends piped: input is written while output is read, so neither
//! the source nor the encoded result is buffered twice.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::audio::{AudioBuffer, AudioFormat};
use crate::core::error::{Result, TtsError};

/// Encoder bitrate for MP3 output
const MP3_BITRATE: &str = "192k";

/// Encoder bitrate for Opus output
const OPUS_BITRATE: &str = "96k";

/// Encode a complete WAV file into the requested container
///
/// WAV input passes through untouched. Sample rate is preserved; lossy
/// targets receive 16-bit input.
pub async fn encode(wav_bytes: Vec<u8>, target: AudioFormat) -> Result<Vec<u8>> {
    if target == AudioFormat::Wav {
        return Ok(wav_bytes);
    }
    run_ffmpeg(wav_bytes, &encode_args(target))
        .await
        .map_err(|e| TtsError::EncodeFailure {
            message: e.to_string(),
        })
}

/// Decode any container into a mono PCM buffer at the given rate
///
/// Absorbs adapters that cannot emit WAV (for example a cloud service
/// that only returns MP3) before their chunks reach the stitcher.
pub async fn decode_to_pcm(bytes: Vec<u8>, sample_rate: u32) -> Result<AudioBuffer> {
    let rate = sample_rate.to_string();
    let args = [
        "-f", "s16le", "-acodec", "pcm_s16le", "-ar", rate.as_str(), "-ac", "1",
    ];
    let raw = run_ffmpeg(bytes, &args)
        .await
        .map_err(|e| TtsError::StitchFailure {
            message: format!("buffer decode failed: {e}"),
        })?;
    Ok(AudioBuffer::from_pcm16le(&raw, sample_rate))
}

/// Output arguments for each encode target
fn encode_args(target: AudioFormat) -> Vec<&'static str> {
    match target {
        AudioFormat::Mp3 => vec!["-f", "mp3", "-codec:a", "libmp3lame", "-b:a", MP3_BITRATE],
        AudioFormat::Opus => vec!["-f", "ogg", "-codec:a", "libopus", "-b:a", OPUS_BITRATE],
        AudioFormat::Flac => vec!["-f", "flac", "-codec:a", "flac"],
        AudioFormat::Wav => vec!["-f", "wav", "-codec:a", "pcm_s16le"],
    }
}

/// Run ffmpeg with piped stdio, feeding input concurrently with reads
async fn run_ffmpeg(input: Vec<u8>, output_args: &[&str]) -> anyhow::Result<Vec<u8>> {
    let mut child = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-i", "pipe:0"])
        .args(output_args)
        .arg("pipe:1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow::anyhow!("encoder stdin unavailable"))?;
    let writer = tokio::spawn(async move {
        // The encoder may close its input early; that is not an error here
        let _ = stdin.write_all(&input).await;
        let _ = stdin.shutdown().await;
    });

    let output = child.wait_with_output().await?;
    let _ = writer.await;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "encoder exited with {}: {}",
            output.status,
            stderr.chars().take(200).collect::<String>()
        );
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_args_per_format() {
        assert!(encode_args(AudioFormat::Mp3).contains(&"libmp3lame"));
        assert!(encode_args(AudioFormat::Mp3).contains(&MP3_BITRATE));
        assert!(encode_args(AudioFormat::Opus).contains(&"libopus"));
        assert!(encode_args(AudioFormat::Opus).contains(&OPUS_BITRATE));
        assert!(encode_args(AudioFormat::Flac).contains(&"flac"));
        assert!(encode_args(AudioFormat::Wav).contains(&"pcm_s16le"));
    }

    #[tokio::test]
    async fn test_wav_target_passes_through() {
        let bytes = vec![1u8, 2, 3, 4];
        let out = encode(bytes.clone(), AudioFormat::Wav).await.unwrap();
        assert_eq!(out, bytes);
    }
}
