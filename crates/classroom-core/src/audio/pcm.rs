//! Framing of narration payloads: base64 text wrapping raw little-endian
//! signed 16-bit PCM.

use super::AudioAsset;
use crate::error::NarrationError;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Format produced by the narration service.
pub const NARRATION_FORMAT: PcmFormat = PcmFormat {
    sample_rate: 24_000,
    channels: 1,
};

const BYTES_PER_SAMPLE: usize = 2;

/// Strip the base64 transport layer.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, NarrationError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(NarrationError::Decode("empty payload".to_string()));
    }
    BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| NarrationError::Decode(format!("invalid base64: {err}")))
}

/// Decode interleaved s16le samples into normalized floats.
pub fn decode_pcm16le(bytes: &[u8], format: PcmFormat) -> Result<AudioAsset, NarrationError> {
    if format.channels == 0 || format.sample_rate == 0 {
        return Err(NarrationError::Decode(format!(
            "unsupported format: {} Hz, {} channels",
            format.sample_rate, format.channels
        )));
    }
    let frame_bytes = BYTES_PER_SAMPLE * usize::from(format.channels);
    if bytes.is_empty() {
        return Err(NarrationError::Decode("no audio samples".to_string()));
    }
    if bytes.len() % frame_bytes != 0 {
        return Err(NarrationError::Decode(format!(
            "truncated payload: {} bytes is not a whole number of {frame_bytes}-byte frames",
            bytes.len()
        )));
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32_768.0)
        .collect();
    Ok(AudioAsset::new(samples, format.sample_rate, format.channels))
}

/// Inverse of [`decode_pcm16le`] + [`decode_base64`]; used by local
/// narration stand-ins.
pub fn encode_base64_pcm16le(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        let scaled = (sample.clamp(-1.0, 1.0) * 32_767.0).round() as i16;
        bytes.extend_from_slice(&scaled.to_le_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_samples_to_unit_range() {
        let bytes = [0x00, 0x80, 0x00, 0x00, 0x00, 0x40];
        let asset = decode_pcm16le(&bytes, NARRATION_FORMAT).expect("valid pcm");
        assert_eq!(asset.samples(), &[-1.0f32, 0.0, 0.5]);
        assert_eq!(asset.frames(), 3);
    }

    #[test]
    fn duration_follows_frame_count_and_rate() {
        let bytes = vec![0u8; 24_000 * 2 * 3];
        let asset = decode_pcm16le(&bytes, NARRATION_FORMAT).expect("valid pcm");
        assert!((asset.duration_secs() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn odd_length_and_empty_payloads_are_decode_failures() {
        assert!(matches!(
            decode_pcm16le(&[0x01, 0x02, 0x03], NARRATION_FORMAT),
            Err(NarrationError::Decode(_))
        ));
        assert!(matches!(
            decode_pcm16le(&[], NARRATION_FORMAT),
            Err(NarrationError::Decode(_))
        ));
        assert!(matches!(decode_base64("  "), Err(NarrationError::Decode(_))));
        assert!(matches!(decode_base64("@@not base64@@"), Err(NarrationError::Decode(_))));
    }

    #[test]
    fn stereo_frames_must_be_complete() {
        let stereo = PcmFormat {
            sample_rate: 8_000,
            channels: 2,
        };
        assert!(decode_pcm16le(&[0, 0, 0, 0, 0, 0], stereo).is_err());
        let asset = decode_pcm16le(&[0; 8], stereo).expect("two stereo frames");
        assert_eq!(asset.frames(), 2);
    }

    #[test]
    fn base64_transport_survives_line_wrapping() {
        let payload = encode_base64_pcm16le(&[0.0, 0.25, -0.25, 0.0]);
        let wrapped = format!("{}\n{}", &payload[..4], &payload[4..]);
        let bytes = decode_base64(&wrapped).expect("wrapped base64");
        let asset = decode_pcm16le(&bytes, NARRATION_FORMAT).expect("pcm");
        assert_eq!(asset.frames(), 4);
    }
}
