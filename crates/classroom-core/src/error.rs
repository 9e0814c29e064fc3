use thiserror::Error;

/// Failures of the narration pipeline. All of them are recovered locally by
/// resetting the engine to idle; none are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrationError {
    #[error("narration service failed: {0}")]
    Generation(String),
    #[error("narration payload could not be decoded: {0}")]
    Decode(String),
    #[error("audio output rejected playback: {0}")]
    PlaybackScheduling(String),
}

impl NarrationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Generation(_) => "generation_failure",
            Self::Decode(_) => "decode_failure",
            Self::PlaybackScheduling(_) => "playback_scheduling_failure",
        }
    }

    /// Short text suitable for a one-shot notice in the presenter view.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Generation(_) => "Narration could not be generated right now. Please try again.",
            Self::Decode(_) => "The narration audio was unreadable. Please try again.",
            Self::PlaybackScheduling(_) => "Audio output is unavailable. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("translation service unreachable: {0}")]
    Transport(String),
    #[error("translation service returned no text")]
    Empty,
    #[error("translation service is not configured")]
    NotConfigured,
}
