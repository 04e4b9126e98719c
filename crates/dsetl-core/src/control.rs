//! Run-wide abort token.
//!
//! Under the `abort` failure policy the first failed dataset trips the token;
//! every worker checks it before starting a job and the transport polls it
//! from its progress callback so in-flight transfers stop promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Cheap to clone; all clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent.
    pub fn trip(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_tripped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
