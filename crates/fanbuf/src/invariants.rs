//! Debug assertion macros for pipeline buffer invariants.
//!
//! These are runtime checks for the structural rules the buffer relies on.
//! They are only active in debug builds (`debug_assert!`), so there is zero
//! overhead in release builds. A failing check is a bug in the buffer, not
//! a runtime condition, and aborts the offending thread.

// =============================================================================
// Sequence numbers are strictly increasing along the arena
// =============================================================================

/// Assert that a newly assigned sequence number is ahead of the newest
/// record already in the arena.
///
/// Used in: `insert()` before appending the record.
macro_rules! debug_assert_seq_ahead {
    ($newest:expr, $assigned:expr) => {
        debug_assert!(
            $newest < $assigned,
            "sequence regressed: newest in buffer is {}, assigning {}",
            $newest,
            $assigned
        )
    };
}

// =============================================================================
// Each consumer observes a record at most once
// =============================================================================

/// Assert that the record under a cursor has not been observed yet by that
/// cursor's consumer.
///
/// Used in: `take_next()` before marking the observation flag.
macro_rules! debug_assert_unobserved {
    ($flag:expr, $seq:expr, $lane:expr) => {
        debug_assert!(
            !$flag,
            "record seq {} already observed by the {} consumer",
            $seq,
            $lane
        )
    };
}

// =============================================================================
// Reclamation is tail-first and complete-only
// =============================================================================

/// Assert that the record about to be freed has been observed by both
/// consumers.
///
/// Used in: `reclaim_one()` immediately before popping the tail.
macro_rules! debug_assert_reclaimable {
    ($processed:expr, $stored:expr, $seq:expr) => {
        debug_assert!(
            $processed && $stored,
            "freeing record seq {} before both consumers observed it (processed: {}, stored: {})",
            $seq,
            $processed,
            $stored
        )
    };
}

/// Assert that no cursor still points at (or behind) a record being freed.
///
/// Used in: `reclaim_one()` after popping the tail.
macro_rules! debug_assert_cursor_ahead {
    ($cursor:expr, $freed_seq:expr, $lane:expr) => {
        debug_assert!(
            $cursor.map_or(true, |c| c > $freed_seq),
            "{} cursor points at freed record seq {} (cursor: {:?})",
            $lane,
            $freed_seq,
            $cursor
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_cursor_ahead;
pub(crate) use debug_assert_reclaimable;
pub(crate) use debug_assert_seq_ahead;
pub(crate) use debug_assert_unobserved;
