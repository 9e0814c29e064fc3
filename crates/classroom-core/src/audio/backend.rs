use super::pcm::{self, NARRATION_FORMAT};
use crate::error::NarrationError;
use std::sync::Arc;

/// Decoded narration: interleaved samples plus their framing.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl AudioAsset {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Frame index for a position, clamped to the asset.
    pub fn frame_at(&self, seconds: f64) -> usize {
        let frame = (seconds.max(0.0) * f64::from(self.sample_rate)).round() as usize;
        frame.min(self.frames())
    }
}

/// Opaque token for one scheduled playback on a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(pub(crate) u64);

impl PlaybackHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Audio output capability injected into the narration engine.
pub trait AudioBackend {
    /// Turn a raw narration payload into a playable asset.
    fn decode(&mut self, bytes: &[u8]) -> Result<AudioAsset, NarrationError> {
        pcm::decode_pcm16le(bytes, NARRATION_FORMAT)
    }

    /// Start playing `asset` from `start_frame` at `rate`.
    fn schedule(
        &mut self,
        asset: &AudioAsset,
        start_frame: usize,
        rate: f64,
    ) -> Result<PlaybackHandle, NarrationError>;

    /// Stop a scheduled playback. Unknown or finished handles are ignored.
    fn stop(&mut self, handle: PlaybackHandle);
}
