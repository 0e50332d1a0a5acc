use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use kloner_core::{CoreError, LlmError};
use std::io::Cursor;
use tracing::debug;

/// Raw TTS output is 16-bit little-endian mono PCM at this rate.
pub const TTS_SAMPLE_RATE: u32 = 24_000;
pub const WAV_HEADER_LEN: usize = 44;

pub fn tts_wav_spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: TTS_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

#[derive(Debug, Clone)]
pub struct AudioClip {
    pub wav: Vec<u8>,
    pub duration_secs: f64,
}

fn decode_failed(reason: impl ToString) -> CoreError {
    LlmError::AudioDecodeFailed {
        reason: reason.to_string(),
    }
    .into()
}

pub fn decode_base64(payload: &str) -> Result<Vec<u8>, CoreError> {
    STANDARD.decode(payload.trim()).map_err(decode_failed)
}

/// Wraps headerless PCM in a WAV container. A trailing odd byte is dropped.
pub fn pcm_to_wav(pcm: &[u8]) -> Result<Vec<u8>, CoreError> {
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    {
        let mut writer = WavWriter::new(Cursor::new(&mut wav), tts_wav_spec()).map_err(decode_failed)?;
        for frame in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([frame[0], frame[1]]))
                .map_err(decode_failed)?;
        }
        writer.finalize().map_err(decode_failed)?;
    }
    Ok(wav)
}

pub fn wav_duration_secs(wav: &[u8]) -> Result<f64, CoreError> {
    let reader = WavReader::new(Cursor::new(wav)).map_err(decode_failed)?;
    let spec = reader.spec();
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

/// Turns the base64 payload from the TTS endpoint into a playable clip.
pub fn decode_voiceover(payload: &str) -> Result<AudioClip, CoreError> {
    let pcm = decode_base64(payload)?;
    let wav = pcm_to_wav(&pcm)?;
    let duration_secs = wav_duration_secs(&wav)?;
    debug!("Decoded {} bytes of PCM, {:.2}s of audio", pcm.len(), duration_secs);
    Ok(AudioClip { wav, duration_secs })
}
