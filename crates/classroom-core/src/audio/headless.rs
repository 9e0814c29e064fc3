use super::{AudioAsset, AudioBackend, PlaybackHandle};
use crate::error::NarrationError;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// One `schedule` call as seen by the headless backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledPlayback {
    pub handle: PlaybackHandle,
    pub start_frame: usize,
    pub rate: f64,
}

#[derive(Debug, Default)]
struct HeadlessLog {
    next_id: u64,
    active: Vec<PlaybackHandle>,
    scheduled: Vec<ScheduledPlayback>,
    stopped: Vec<PlaybackHandle>,
    reject_scheduling: bool,
}

/// Backend without an audio device. Playback is only bookkept, which makes
/// it suitable for tests and for presenting on machines without output.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    log: Arc<Mutex<HeadlessLog>>,
}

/// Read side of a [`HeadlessBackend`], kept by whoever wants to inspect it
/// after handing the backend to an engine.
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    log: Arc<Mutex<HeadlessLog>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            log: Arc::clone(&self.log),
        }
    }

    fn log(&self) -> MutexGuard<'_, HeadlessLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HeadlessProbe {
    fn log(&self) -> MutexGuard<'_, HeadlessLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handles scheduled and not yet stopped.
    pub fn active(&self) -> Vec<PlaybackHandle> {
        self.log().active.clone()
    }

    pub fn scheduled(&self) -> Vec<ScheduledPlayback> {
        self.log().scheduled.clone()
    }

    pub fn last_scheduled(&self) -> Option<ScheduledPlayback> {
        self.log().scheduled.last().cloned()
    }

    pub fn stopped(&self) -> Vec<PlaybackHandle> {
        self.log().stopped.clone()
    }

    /// Simulate a suspended output context.
    pub fn set_reject_scheduling(&self, reject: bool) {
        self.log().reject_scheduling = reject;
    }
}

impl AudioBackend for HeadlessBackend {
    fn schedule(
        &mut self,
        asset: &AudioAsset,
        start_frame: usize,
        rate: f64,
    ) -> Result<PlaybackHandle, NarrationError> {
        let mut log = self.log();
        if log.reject_scheduling {
            return Err(NarrationError::PlaybackScheduling(
                "headless output is suspended".to_string(),
            ));
        }
        log.next_id = log.next_id.wrapping_add(1);
        let handle = PlaybackHandle(log.next_id);
        log.active.push(handle);
        log.scheduled.push(ScheduledPlayback {
            handle,
            start_frame,
            rate,
        });
        debug!(
            handle = handle.id(),
            start_frame,
            frames = asset.frames(),
            rate,
            "Scheduled headless playback"
        );
        Ok(handle)
    }

    fn stop(&mut self, handle: PlaybackHandle) {
        let mut log = self.log();
        let before = log.active.len();
        log.active.retain(|active| *active != handle);
        if log.active.len() != before {
            log.stopped.push(handle);
            debug!(handle = handle.id(), "Stopped headless playback");
        }
    }
}
