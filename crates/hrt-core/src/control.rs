//! Call cancellation: a shared abort flag checked by the retry loop.
//!
//! A caller keeps a clone of the token and flips it from another thread (for
//! example on Ctrl-C or a caller-side deadline). The retry loop checks it at
//! the top of every attempt and before every backoff sleep; an attempt already
//! in flight runs to completion under the sender's own timeouts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable abort flag. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
