//! Audio plumbing for narration: PCM framing, decoded assets, and the output
//! backends the narration engine schedules playback on.

mod backend;
mod headless;
pub mod pcm;
#[cfg(feature = "speaker")]
mod speaker;

pub use backend::{AudioAsset, AudioBackend, PlaybackHandle};
pub use headless::{HeadlessBackend, HeadlessProbe, ScheduledPlayback};
pub use pcm::{NARRATION_FORMAT, PcmFormat};
#[cfg(feature = "speaker")]
pub use speaker::SpeakerBackend;
