//! Narration playback for a single slide.
//!
//! The backend only knows how to start and stop a source, so the engine keeps
//! its own position law: while playing,
//! `position = offset + (now - started_at) * rate`, with `offset` and
//! `started_at` re-anchored on every play, seek, and rate change.

mod state;

pub use state::{NarrationView, PlaybackStatus};

use crate::audio::{AudioAsset, AudioBackend, PlaybackHandle, pcm};
use crate::clock::Clock;
use crate::error::NarrationError;
use crate::polling::PollLoop;
use crate::services::NarrationService;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MIN_PLAYBACK_RATE: f64 = 0.25;
pub const MAX_PLAYBACK_RATE: f64 = 3.0;

/// Outstanding narration request handed out by [`NarrationEngine::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareTicket {
    request_id: u64,
    text: String,
}

impl PrepareTicket {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub struct NarrationEngine {
    backend: Box<dyn AudioBackend>,
    clock: Box<dyn Clock>,
    status: PlaybackStatus,
    asset: Option<AudioAsset>,
    handle: Option<PlaybackHandle>,
    poll: PollLoop,
    offset: f64,
    started_at: Option<Duration>,
    rate: f64,
    request_id: u64,
    pending_request: Option<u64>,
    notice: Option<NarrationError>,
}

impl NarrationEngine {
    pub fn new(backend: Box<dyn AudioBackend>, clock: Box<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            status: PlaybackStatus::Idle,
            asset: None,
            handle: None,
            poll: PollLoop::new(),
            offset: 0.0,
            started_at: None,
            rate: 1.0,
            request_id: 0,
            pending_request: None,
            notice: None,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        if let Some(rate) = sanitize_rate(rate) {
            self.rate = rate;
        }
        self
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn duration(&self) -> f64 {
        self.asset
            .as_ref()
            .map(AudioAsset::duration_secs)
            .unwrap_or(0.0)
    }

    /// Current playback position in seconds, always within `[0, duration]`.
    pub fn position(&self) -> f64 {
        match self.status {
            PlaybackStatus::Playing => self.position_at(self.clock.now()),
            _ => self.offset,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_active()
    }

    pub fn has_asset(&self) -> bool {
        self.asset.is_some()
    }

    pub fn has_live_playback(&self) -> bool {
        self.handle.is_some()
    }

    pub fn view(&self) -> NarrationView {
        NarrationView::new(self.status, self.position(), self.duration(), self.rate)
    }

    /// One-shot notice for the most recent recovered failure.
    pub fn take_notice(&mut self) -> Option<NarrationError> {
        self.notice.take()
    }

    /// Start preparing narration for `text`.
    ///
    /// Returns a ticket to complete with the collaborator's answer, or `None`
    /// when the engine is not idle or there is nothing to narrate.
    pub fn prepare(&mut self, text: &str) -> Option<PrepareTicket> {
        if self.status != PlaybackStatus::Idle {
            debug!(status = %self.status, "Ignoring prepare; narration already in progress");
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring prepare for empty text");
            return None;
        }
        self.release_asset();
        self.request_id = self.request_id.wrapping_add(1);
        self.pending_request = Some(self.request_id);
        self.status = PlaybackStatus::Decoding;
        info!(
            request_id = self.request_id,
            chars = text.chars().count(),
            "Preparing narration"
        );
        Some(PrepareTicket {
            request_id: self.request_id,
            text: text.to_string(),
        })
    }

    /// Finish a prepare with the collaborator's base64 payload.
    ///
    /// Tickets that no longer match the pending request are ignored.
    pub fn complete_prepare(
        &mut self,
        ticket: PrepareTicket,
        payload: Result<String, NarrationError>,
    ) -> Result<(), NarrationError> {
        if self.pending_request != Some(ticket.request_id)
            || self.status != PlaybackStatus::Decoding
        {
            debug!(
                request_id = ticket.request_id,
                current = ?self.pending_request,
                "Ignoring stale narration payload"
            );
            return Ok(());
        }
        self.pending_request = None;

        let decoded = payload.and_then(|payload| {
            let bytes = pcm::decode_base64(&payload)?;
            self.backend.decode(&bytes)
        });
        match decoded {
            Ok(asset) => {
                info!(
                    request_id = ticket.request_id,
                    duration_secs = asset.duration_secs(),
                    frames = asset.frames(),
                    "Narration ready"
                );
                self.asset = Some(asset);
                self.offset = 0.0;
                self.started_at = None;
                self.status = PlaybackStatus::Ready;
                Ok(())
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Prepare and complete in one step against a blocking collaborator.
    pub fn prepare_with(
        &mut self,
        service: &dyn NarrationService,
        text: &str,
        voice: &str,
    ) -> Result<(), NarrationError> {
        let Some(ticket) = self.prepare(text) else {
            return Ok(());
        };
        let payload = service.synthesize(ticket.text(), voice);
        self.complete_prepare(ticket, payload)
    }

    pub fn play(&mut self) -> Result<(), NarrationError> {
        match self.status {
            PlaybackStatus::Ready | PlaybackStatus::Paused => {}
            PlaybackStatus::Ended => {
                debug!("Replaying narration from the start");
                self.offset = 0.0;
            }
            status => {
                debug!(%status, "Ignoring play");
                return Ok(());
            }
        }
        let now = self.clock.now();
        self.start_playback(now)?;
        info!(offset = self.offset, rate = self.rate, "Narration playing");
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.status != PlaybackStatus::Playing {
            debug!(status = %self.status, "Ignoring pause");
            return;
        }
        let now = self.clock.now();
        self.offset = self.position_at(now);
        if self.offset >= self.duration() {
            self.finish();
            return;
        }
        self.halt_playback();
        self.status = PlaybackStatus::Paused;
        info!(position = self.offset, "Narration paused");
    }

    /// Jump to `target` seconds, clamped to the track. Landing on the end
    /// of the track ends it.
    pub fn seek(&mut self, target: f64) -> Result<(), NarrationError> {
        if !self.status.has_asset() || !target.is_finite() {
            debug!(status = %self.status, target, "Ignoring seek");
            return Ok(());
        }
        let duration = self.duration();
        let target = target.clamp(0.0, duration);
        if target >= duration {
            self.finish();
            debug!(position = target, "Narration seeked to the end");
            return Ok(());
        }
        match self.status {
            PlaybackStatus::Playing => {
                self.halt_playback();
                self.offset = target;
                let now = self.clock.now();
                self.start_playback(now)?;
            }
            PlaybackStatus::Ended => {
                self.offset = target;
                self.status = PlaybackStatus::Paused;
            }
            _ => self.offset = target,
        }
        debug!(position = target, status = %self.status, "Narration seeked");
        Ok(())
    }

    /// Change the playback rate without a jump in position.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), NarrationError> {
        let Some(rate) = sanitize_rate(rate) else {
            debug!(rate, "Ignoring invalid playback rate");
            return Ok(());
        };
        if self.status == PlaybackStatus::Playing {
            let now = self.clock.now();
            self.offset = self.position_at(now);
            self.rate = rate;
            if self.offset >= self.duration() {
                self.finish();
                return Ok(());
            }
            self.halt_playback();
            self.start_playback(now)?;
        } else {
            self.rate = rate;
        }
        info!(rate, position = self.offset, "Narration rate changed");
        Ok(())
    }

    /// Per-frame poll; detects the end of the track.
    pub fn tick(&mut self) -> PlaybackStatus {
        if self.status != PlaybackStatus::Playing || !self.poll.is_active() {
            return self.status;
        }
        let position = self.position_at(self.clock.now());
        if position >= self.duration() {
            self.finish();
        }
        self.status
    }

    /// Stop playback and release everything held for the current track.
    /// Safe to call in any state, any number of times.
    pub fn teardown(&mut self) {
        if self.status == PlaybackStatus::Idle && self.asset.is_none() && self.handle.is_none() {
            self.poll.cancel();
            self.pending_request = None;
            return;
        }
        let previous = self.status;
        self.halt_playback();
        self.release_asset();
        self.pending_request = None;
        self.offset = 0.0;
        self.status = PlaybackStatus::Idle;
        info!(previous = %previous, "Narration torn down");
    }

    fn fail(&mut self, err: NarrationError) {
        warn!(kind = err.kind(), "Narration failed: {err}");
        self.teardown();
        self.notice = Some(err);
    }

    fn position_at(&self, now: Duration) -> f64 {
        let elapsed = self
            .started_at
            .map(|started| now.saturating_sub(started).as_secs_f64())
            .unwrap_or(0.0);
        (self.offset + elapsed * self.rate).clamp(0.0, self.duration())
    }

    fn start_playback(&mut self, now: Duration) -> Result<(), NarrationError> {
        self.halt_playback();
        let Some(asset) = self.asset.as_ref() else {
            return Ok(());
        };
        let start_frame = asset.frame_at(self.offset);
        match self.backend.schedule(asset, start_frame, self.rate) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.started_at = Some(now);
                self.status = PlaybackStatus::Playing;
                self.poll.start();
                Ok(())
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    fn halt_playback(&mut self) {
        self.poll.cancel();
        self.started_at = None;
        if let Some(handle) = self.handle.take() {
            self.backend.stop(handle);
        }
    }

    fn finish(&mut self) {
        self.halt_playback();
        self.offset = self.duration();
        self.status = PlaybackStatus::Ended;
        info!(duration = self.offset, "Narration ended");
    }

    fn release_asset(&mut self) {
        if self.asset.take().is_some() {
            debug!("Released narration asset");
        }
    }
}

impl Drop for NarrationEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn sanitize_rate(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate > 0.0).then(|| rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE))
}
