//! Debug assertion macros for FIFO/ring invariants.
//!
//! These are only active in debug builds (`#[cfg(debug_assertions)]`), so
//! there is zero overhead in release builds. Mirrors the invariant
//! catalogue in spec.md §8.

/// INV-1 (Conservation): occupancy never exceeds capacity.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded-count violated: count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// Sequence numbers (head/tail) only ever move forward.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "monotonic-progress violated: {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

/// INV-5 (Pool accounting): total == free + in_use at every mutex exit.
macro_rules! debug_assert_pool_accounting {
    ($total:expr, $free:expr, $in_use:expr) => {
        debug_assert!(
            $total == $free + $in_use,
            "pool accounting violated: total {} != free {} + in_use {}",
            $total,
            $free,
            $in_use
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_pool_accounting;
