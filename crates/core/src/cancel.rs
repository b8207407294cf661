//! Cooperative cancellation (spec §5).
//!
//! Every long-running operation (connector calls, fragmented-file loops)
//! accepts a `CancellationToken` and is expected to check it at connector
//! boundaries and between blob iterations. Cancellation is advisory: work
//! already issued to the backend is not rolled back, matching §5's "partial
//! progress is observable" guarantee.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// A cheaply cloneable, shareable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that can never be cancelled, for call sites that don't need
    /// cancellation (tests, one-shot scripts).
    pub fn none() -> Self {
        Self::new()
    }

    /// Mark this token (and every clone of it) as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether this token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Err(Error::Cancelled)` if the token has been cancelled,
    /// `Ok(())` otherwise. Intended to be called between loop iterations.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
