//! Gap-exhaustion detection and respacing.
//!
//! Repeated subdivision between the same two neighbors eventually leaves no
//! room for randomized insertion. [`needs_rebalancing`] detects that state;
//! [`rebalance_positions`] proposes evenly respaced keys. Applying the new
//! values atomically across all affected items is the server's job — the
//! calculator only proposes them.

/// Integer-scheme gap below which a list should be respaced.
///
/// Once adjacent keys converge this far the randomized branch can no longer
/// engage; the midpoint fallback survives a few more subdivisions before
/// duplicate positions become possible.
pub const REBALANCE_THRESHOLD: i64 = 4;

/// Returns `true` iff any adjacent pair of `sorted_positions` has converged
/// below `threshold`.
#[must_use]
pub fn needs_rebalancing(sorted_positions: &[i64], threshold: i64) -> bool {
    sorted_positions
        .windows(2)
        .any(|pair| (pair[1] - pair[0]).abs() < threshold)
}

/// Proposes `count` evenly spaced positions starting at `start_pos` with a
/// uniform `spacing` gap, restoring headroom for future insertions.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn rebalance_positions(count: usize, start_pos: i64, spacing: i64) -> Vec<i64> {
    (0..count)
        .map(|i| start_pos + (i as i64) * spacing)
        .collect()
}
