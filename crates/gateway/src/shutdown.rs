//! Shutdown signalling for the accept loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag for ending ingress externally.
///
/// Multiple clones may trigger it; only the first has effect, subsequent
/// calls are no-ops. The accept loop polls the flag between accepts.
/// Signal handlers set the same atomic via `signal-hook`'s flag API.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    triggered: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Creates an untriggered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Idempotent.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
    }

    /// Returns `true` once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// The underlying atomic, for registering OS signal handlers against.
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.triggered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = ShutdownFlag::new();
        let clone = flag.clone();

        assert!(!clone.is_triggered());
        flag.trigger();
        assert!(clone.is_triggered());

        // Idempotent.
        clone.trigger();
        assert!(flag.is_triggered());
    }
}
