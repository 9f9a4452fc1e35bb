//! Ambient read context
//!
//! Every operation that may fetch a node takes a [`ReadContext`]. The context
//! carries a cancellation flag that is checked at each fetch, the only point
//! where a traversal can block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tessera_core::{Error, Result};

/// Cancellation handle threaded through tree reads
///
/// Clones share the same flag, so a caller can hand a clone to a reader and
/// cancel it from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ReadContext {
    cancelled: Arc<AtomicBool>,
}

impl ReadContext {
    /// Create a live context
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every read using this context (or a clone of it)
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with [`Error::Cancelled`] once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
