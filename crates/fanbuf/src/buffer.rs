use crate::config::BufferConfig;
use crate::error::BufferError;
use crate::invariants::{
    debug_assert_cursor_ahead, debug_assert_reclaimable, debug_assert_seq_ahead,
    debug_assert_unobserved,
};
use crate::record::{Reading, Record, RecordSnapshot};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

// =============================================================================
// SYNCHRONIZATION STRATEGY
// =============================================================================
//
// A single mutex guards the whole mutable state: the record arena, both
// cursors, the observation flags and the closed flag. Every consumer
// operation writes at least one of those, so a reader/writer split would
// degenerate to exclusive access anyway.
//
// Three condition variables hang off that mutex, one per waiter class:
//
// - `cv_process` - signalled when `next_to_process` goes nil -> non-nil,
//   and on close.
// - `cv_store`   - symmetric, for `next_to_store`.
// - `cv_reclaim` - signalled when the tail record gains its second
//   observation flag, and on close.
//
// Splitting the variables keeps each waiter asleep through events meant
// for the others: a plain insert never wakes the reclaimer, and the
// process consumer never wakes for store-side progress.
//
// Every wait sits in a `while`-loop predicate re-check and uses a bounded
// timeout as a watchdog against missed wakeups. The timeout never carries
// correctness: on expiry the predicate is simply evaluated again.
//
// ## Arena layout
//
// Records live in a `VecDeque`, oldest (the reclamation tail) at the
// front, newest at the back. Sequence numbers are assigned under the mutex
// and are strictly increasing, so a record's slot index is just
// `seq - front_seq`. Cursors are stored as `Option<u64>` sequence numbers
// rather than references: a cursor is `None` exactly when its consumer has
// observed everything currently buffered.
//
// Records newer than a cursor are never reclaimed (reclamation requires
// both flags, and everything at or after a cursor has that cursor's flag
// still unset), so the region a cursor walks is always contiguous and
// `seq + 1` is its in-arena successor until the head is reached.
//
// =============================================================================

/// Which consumer a take operation acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Process,
    Store,
}

impl Lane {
    fn name(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Store => "store",
        }
    }
}

/// All mutable buffer state, guarded by the one mutex.
#[derive(Debug)]
struct BufferState {
    /// Live records, oldest at the front (tail), newest at the back (head).
    records: VecDeque<Record>,
    /// Sequence number the next insertion will be assigned. Starts at 1.
    next_seq: u64,
    /// Oldest record not yet observed by the process consumer.
    next_to_process: Option<u64>,
    /// Oldest record not yet observed by the store consumer.
    next_to_store: Option<u64>,
    /// Set once by `close()`, never cleared.
    closed: bool,
}

impl BufferState {
    fn cursor(&self, lane: Lane) -> Option<u64> {
        match lane {
            Lane::Process => self.next_to_process,
            Lane::Store => self.next_to_store,
        }
    }

    fn set_cursor(&mut self, lane: Lane, cursor: Option<u64>) {
        match lane {
            Lane::Process => self.next_to_process = cursor,
            Lane::Store => self.next_to_store = cursor,
        }
    }

    /// Slot lookup by sequence number. Panics if `seq` is not in the
    /// arena, which would mean a cursor escaped the live region.
    fn record_at_mut(&mut self, seq: u64) -> &mut Record {
        let front_seq = self.records.front().map_or(seq, |r| r.seq);
        &mut self.records[(seq - front_seq) as usize]
    }
}

/// Ordered multi-cursor queue connecting one set of producers to the
/// process consumer, the store consumer and the reclaimer.
///
/// Every inserted record is delivered exactly once to each of the two
/// consumers, in insertion order per consumer, and is freed only after
/// both have observed it. See the crate-level docs for the full protocol.
#[derive(Debug)]
pub struct PipelineBuffer {
    state: Mutex<BufferState>,
    cv_process: Condvar,
    cv_store: Condvar,
    cv_reclaim: Condvar,
    config: BufferConfig,
}

impl PipelineBuffer {
    /// Creates an empty, open buffer.
    pub fn new(config: BufferConfig) -> Self {
        Self {
            state: Mutex::new(BufferState {
                records: VecDeque::new(),
                next_seq: 1,
                next_to_process: None,
                next_to_store: None,
                closed: false,
            }),
            cv_process: Condvar::new(),
            cv_store: Condvar::new(),
            cv_reclaim: Condvar::new(),
            config,
        }
    }

    /// Locks the state. A poisoned mutex means a worker panicked
    /// mid-operation and the buffer contents can no longer be trusted, so
    /// the panic is propagated.
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().expect("pipeline buffer mutex poisoned")
    }

    /// One bounded wait on `cv`. The caller re-checks its predicate in a
    /// loop; a timeout expiry is indistinguishable from a spurious wakeup.
    fn wait<'a>(
        &self,
        cv: &Condvar,
        state: MutexGuard<'a, BufferState>,
    ) -> MutexGuard<'a, BufferState> {
        let (state, _timed_out) = cv
            .wait_timeout(state, self.config.wait_timeout)
            .expect("pipeline buffer mutex poisoned");
        state
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Appends a reading at the head and returns its assigned sequence
    /// number.
    ///
    /// If either cursor was nil it now points at the new record and the
    /// corresponding consumer is woken.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Closed`] once [`close`](Self::close) has been
    /// called; the buffer is left untouched.
    pub fn insert(&self, reading: Reading) -> Result<u64, BufferError> {
        let mut state = self.lock();
        if state.closed {
            return Err(BufferError::Closed);
        }

        let seq = state.next_seq;
        if let Some(newest) = state.records.back() {
            debug_assert_seq_ahead!(newest.seq, seq);
        }
        state.next_seq += 1;
        state.records.push_back(Record::new(reading, seq));

        if state.next_to_process.is_none() {
            state.next_to_process = Some(seq);
            self.cv_process.notify_all();
        }
        if state.next_to_store.is_none() {
            state.next_to_store = Some(seq);
            self.cv_store.notify_all();
        }

        Ok(seq)
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Blocks until a record unobserved by the process consumer is
    /// available, marks it observed, advances the cursor and returns a
    /// snapshot of it.
    ///
    /// Returns `None` once the buffer is closed and no such record will
    /// ever appear again (end of stream).
    pub fn take_next_to_process(&self) -> Option<RecordSnapshot> {
        self.take_next(Lane::Process)
    }

    /// Store-side counterpart of
    /// [`take_next_to_process`](Self::take_next_to_process).
    pub fn take_next_to_store(&self) -> Option<RecordSnapshot> {
        self.take_next(Lane::Store)
    }

    fn take_next(&self, lane: Lane) -> Option<RecordSnapshot> {
        let mut state = self.lock();
        loop {
            if let Some(seq) = state.cursor(lane) {
                return Some(self.observe(&mut state, lane, seq));
            }
            // A nil cursor after close can never re-arm: insertions are
            // rejected and nothing else creates records.
            if state.closed {
                return None;
            }
            let cv = match lane {
                Lane::Process => &self.cv_process,
                Lane::Store => &self.cv_store,
            };
            state = self.wait(cv, state);
        }
    }

    /// Marks the record at `seq` observed by `lane`, advances the cursor
    /// and wakes the reclaimer when the tail just became fully observed.
    fn observe(&self, state: &mut BufferState, lane: Lane, seq: u64) -> RecordSnapshot {
        let newest_seq = state.records.back().map(|r| r.seq);

        let record = state.record_at_mut(seq);
        match lane {
            Lane::Process => {
                debug_assert_unobserved!(record.processed, seq, lane.name());
                record.processed = true;
            }
            Lane::Store => {
                debug_assert_unobserved!(record.stored, seq, lane.name());
                record.stored = true;
            }
        }
        let fully_observed = record.processed && record.stored;
        let snapshot = record.snapshot();

        // Advance to the newer-side neighbour, or nil at the head.
        let next = if Some(seq) == newest_seq {
            None
        } else {
            Some(seq + 1)
        };
        state.set_cursor(lane, next);

        // The tail is the only record the reclaimer can free; completing
        // any other record cannot unblock it.
        if fully_observed && state.records.front().is_some_and(|r| r.seq == seq) {
            self.cv_reclaim.notify_all();
        }

        snapshot
    }

    // ---------------------------------------------------------------------
    // RECLAIMER API
    // ---------------------------------------------------------------------

    /// Blocks until the tail record has been observed by both consumers,
    /// removes it and returns its snapshot.
    ///
    /// Returns `None` once the buffer is closed and empty (end of stream).
    pub fn reclaim_one(&self) -> Option<RecordSnapshot> {
        let mut state = self.lock();
        loop {
            let tail_ready = match state.records.front() {
                Some(tail) => tail.processed && tail.stored,
                None if state.closed => return None,
                None => false,
            };

            if tail_ready {
                if let Some(record) = state.records.pop_front() {
                    debug_assert_reclaimable!(record.processed, record.stored, record.seq);
                    debug_assert_cursor_ahead!(state.next_to_process, record.seq, "process");
                    debug_assert_cursor_ahead!(state.next_to_store, record.seq, "store");
                    return Some(record.snapshot());
                }
            }

            state = self.wait(&self.cv_reclaim, state);
        }
    }

    // ---------------------------------------------------------------------
    // LIFECYCLE
    // ---------------------------------------------------------------------

    /// Closes the buffer: rejects further insertions and wakes every
    /// waiter so it can re-evaluate its drain condition. Records already
    /// buffered continue to be consumed and reclaimed normally.
    ///
    /// Idempotent.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.cv_process.notify_all();
        self.cv_store.notify_all();
        self.cv_reclaim.notify_all();
    }

    /// Returns `true` when no live records remain.
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of live (not yet reclaimed) records.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }
}

impl Default for PipelineBuffer {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}
