//! Cooperative cancellation of frame computations.

use layerline_core::{LayerlineError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle for cancelling pending frame computations.
///
/// Clones share one flag. Cancelling is sticky: a cancelled token stays
/// cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new, uncancelled token.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Fail with `Cancelled(frame)` once the token has been cancelled.
    pub fn check(&self, frame: i64) -> Result<()> {
        if self.is_cancelled() {
            Err(LayerlineError::Cancelled(frame))
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
