// src/cancel.rs

//! Cooperative cancellation shared between a run and its controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop flag. Long-running loops check it before every fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    stop_requested: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}
