//! Cooperative cancellation for `execute`.
//!
//! `execute` runs synchronously to completion on the caller's thread (spec.md
//! §5), so there is no task to abort from the outside — the caller shares a
//! [`CancellationToken`] and flips it from another thread; the Governor only
//! ever observes it at iteration boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
