//! Configuration for buffer behavior.

use std::time::Duration;

/// Configuration for a [`PipelineBuffer`].
///
/// [`PipelineBuffer`]: crate::PipelineBuffer
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    /// Upper bound on a single condition-variable wait.
    ///
    /// Waiters re-check their predicate on expiry and go back to sleep, so
    /// this is a liveness safety net against missed wakeups, not a
    /// correctness mechanism.
    ///
    /// Default: 10 s
    pub wait_timeout: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(10),
        }
    }
}

impl BufferConfig {
    /// Sets the watchdog timeout for blocking waits.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}
