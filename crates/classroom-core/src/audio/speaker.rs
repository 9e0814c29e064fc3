//! Real audio output through `rodio`.

use super::{AudioAsset, AudioBackend, PlaybackHandle};
use crate::error::NarrationError;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use tracing::{debug, info};

pub struct SpeakerBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sinks: HashMap<PlaybackHandle, Sink>,
    next_id: u64,
}

impl SpeakerBackend {
    pub fn open_default() -> Result<Self, NarrationError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|err| NarrationError::PlaybackScheduling(format!("opening audio output: {err}")))?;
        info!("Opened default audio output");
        Ok(Self {
            _stream: stream,
            handle,
            sinks: HashMap::new(),
            next_id: 0,
        })
    }
}

impl AudioBackend for SpeakerBackend {
    fn schedule(
        &mut self,
        asset: &AudioAsset,
        start_frame: usize,
        rate: f64,
    ) -> Result<PlaybackHandle, NarrationError> {
        let sink = Sink::try_new(&self.handle)
            .map_err(|err| NarrationError::PlaybackScheduling(format!("creating sink: {err}")))?;
        let channels = asset.channels();
        let start_sample = start_frame.min(asset.frames()) * usize::from(channels);
        let remaining = asset.samples()[start_sample..].to_vec();
        sink.append(SamplesBuffer::new(channels, asset.sample_rate(), remaining));
        sink.set_speed(rate as f32);
        sink.play();

        self.next_id = self.next_id.wrapping_add(1);
        let handle = PlaybackHandle(self.next_id);
        self.sinks.insert(handle, sink);
        debug!(handle = handle.id(), start_frame, rate, "Scheduled speaker playback");
        Ok(handle)
    }

    fn stop(&mut self, handle: PlaybackHandle) {
        if let Some(sink) = self.sinks.remove(&handle) {
            sink.stop();
            debug!(handle = handle.id(), "Stopped speaker playback");
        }
    }
}

impl Drop for SpeakerBackend {
    fn drop(&mut self) {
        for (_, sink) in self.sinks.drain() {
            sink.stop();
        }
    }
}
