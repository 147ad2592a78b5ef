//! Error types for buffer operations.

use thiserror::Error;

/// Errors that can occur when feeding the buffer.
///
/// The blocking take and reclaim operations do not use this type: they
/// report end of stream by returning `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The buffer has been closed; no further insertions are accepted.
    #[error("pipeline buffer is closed")]
    Closed,
}

impl BufferError {
    /// Returns `true` if this error indicates the buffer is permanently
    /// unusable for the caller.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
