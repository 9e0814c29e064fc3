use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cancellable per-frame polling registration.
///
/// Armed when playback starts and cancelled by every transition out of
/// playing. Cancelling an already cancelled loop is a no-op.
#[derive(Clone, Debug, Default)]
pub struct PollLoop {
    active: Arc<AtomicBool>,
}

impl PollLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Whether a tick should run right now.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
