//! Dual-consumer FIFO pipeline buffer
//!
//! This crate provides [`PipelineBuffer`], an ordered multi-cursor queue
//! that connects a set of producers to exactly two consumers (a *process*
//! lane and a *store* lane) plus a terminal reclaimer. It guarantees:
//!
//! - **Exactly-once, per consumer**: every inserted record is handed to
//!   each of the two consumers exactly once, in FIFO insertion order.
//! - **Independent lanes**: neither consumer can block the other; either
//!   may run arbitrarily far ahead, bounded only by memory.
//! - **Safe reclamation**: a record is freed only after both consumers
//!   have observed it, strictly oldest-first.
//! - **Clean drain**: after [`PipelineBuffer::close`], buffered records
//!   keep flowing to both consumers and the reclaimer; once drained, every
//!   blocking operation reports end of stream and workers can exit.
//!
//! Synchronisation is one mutex plus three condition variables; there are
//! no lock-free fast paths and no busy-waiting. The buffer is unbounded:
//! back-pressure to producers is out of scope.
//!
//! # Example
//!
//! ```
//! use fanbuf::{BufferConfig, PipelineBuffer, Reading};
//!
//! let buffer = PipelineBuffer::new(BufferConfig::default());
//! buffer.insert(Reading::new(7, 22.5, 1_000)).unwrap();
//! buffer.close();
//!
//! // Each consumer sees the record once, then end of stream.
//! let processed = buffer.take_next_to_process().unwrap();
//! let stored = buffer.take_next_to_store().unwrap();
//! assert_eq!(processed.seq, stored.seq);
//! assert_eq!(buffer.take_next_to_process(), None);
//!
//! // Fully observed, so the reclaimer may free it.
//! buffer.reclaim_one().unwrap();
//! assert!(buffer.is_empty());
//! ```

mod buffer;
mod config;
mod error;
mod invariants;
mod record;

pub use buffer::PipelineBuffer;
pub use config::BufferConfig;
pub use error::BufferError;
pub use record::{Reading, RecordSnapshot};
