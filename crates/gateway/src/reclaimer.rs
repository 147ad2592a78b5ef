//! Reclaimer: frees records once both consumers have observed them.
//!
//! Carries no domain logic at all; it exists so neither consumer pays for
//! memory management on its own lane.

use fanbuf::PipelineBuffer;
use log::{debug, trace};
use std::sync::Arc;

/// Long-running worker that frees fully observed records, oldest first.
pub struct Reclaimer {
    buffer: Arc<PipelineBuffer>,
}

impl Reclaimer {
    /// Creates the worker.
    pub fn new(buffer: Arc<PipelineBuffer>) -> Self {
        Self { buffer }
    }

    /// Reclaims until end of stream, returning the number of records
    /// freed.
    pub fn run(self) -> u64 {
        let mut freed = 0u64;
        while let Some(snapshot) = self.buffer.reclaim_one() {
            trace!("freed record seq {}", snapshot.seq);
            freed += 1;
        }
        debug!("reclaimer drained after freeing {freed} records");
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanbuf::{BufferConfig, Reading};

    #[test]
    fn frees_everything_on_drain() {
        let buffer = Arc::new(PipelineBuffer::new(BufferConfig::default()));
        for i in 0..4 {
            buffer.insert(Reading::new(i, 20.0, 0)).unwrap();
        }
        for _ in 0..4 {
            buffer.take_next_to_process().unwrap();
            buffer.take_next_to_store().unwrap();
        }
        buffer.close();

        let freed = Reclaimer::new(Arc::clone(&buffer)).run();
        assert_eq!(freed, 4);
        assert!(buffer.is_empty());
    }
}
