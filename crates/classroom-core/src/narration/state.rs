use crate::text_utils::format_clock;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Decoding,
    Ready,
    Playing,
    Paused,
    Ended,
}

impl PlaybackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Decoding => "decoding",
            PlaybackStatus::Ready => "ready",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Ended => "ended",
        }
    }

    /// Whether a decoded asset is held in this state.
    pub fn has_asset(self) -> bool {
        matches!(
            self,
            PlaybackStatus::Ready
                | PlaybackStatus::Playing
                | PlaybackStatus::Paused
                | PlaybackStatus::Ended
        )
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time readout of the narration track for the presenter view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationView {
    pub status: PlaybackStatus,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub rate: f64,
    pub position_label: String,
    pub duration_label: String,
}

impl NarrationView {
    pub(crate) fn new(status: PlaybackStatus, position: f64, duration: f64, rate: f64) -> Self {
        Self {
            status,
            position_secs: position,
            duration_secs: duration,
            rate,
            position_label: format_clock(position),
            duration_label: format_clock(duration),
        }
    }

    /// Fraction of the track already played, for a progress bar.
    pub fn progress(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
    }
}
