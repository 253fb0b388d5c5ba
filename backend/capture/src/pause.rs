use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared pause flag of a capture loop.
///
/// Pausing does not interrupt a capture already in flight; it is observed at
/// the loop's next wake-up.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle {
    paused: Arc<AtomicBool>,
}

impl PauseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
