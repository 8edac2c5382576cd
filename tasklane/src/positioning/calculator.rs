//! Position calculation for inserting and moving items.
//!
//! Given the order keys of the neighbors surrounding an insertion point,
//! computes a new integer key that sorts strictly between them. When the gap
//! is wide enough the result is randomized within its middle fraction, so
//! uncoordinated clients inserting into the same gap rarely pick the same
//! key. Head insertions draw from a window of negative keys and never
//! renumber existing items; tail appends randomize the spacing step.
//!
//! The function set is total over finite inputs: no branch fails, and the
//! math stays exact across the 53-bit safe-integer range.

use rand::Rng;

/// Minimum gap between neighbors before randomization engages.
///
/// Below this the midpoint is the only choice that cannot land on a
/// neighbor, so gaps of 1–3 always take the deterministic fallback.
pub const MIN_RANDOM_GAP: i64 = 4;

/// Tuning knobs for the position calculator.
#[derive(Debug, Clone)]
pub struct PositionConfig {
    /// Spacing for tail appends and the width of the head-insertion window.
    pub default_spacing: i64,
    /// Position assigned to the first item of an empty list.
    pub initial_position: i64,
    /// Fraction of a gap (or spacing) used for randomization, in `[0, 1]`.
    ///
    /// Higher values trade predictability for lower collision probability;
    /// `0` disables randomization entirely, yielding deterministic midpoint
    /// and fixed-spacing behavior.
    pub random_range_percent: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            default_spacing: 10_000,
            initial_position: 10_000,
            random_range_percent: 0.5,
        }
    }
}

impl PositionConfig {
    fn spacing(&self) -> i64 {
        self.default_spacing.max(1)
    }

    fn range_fraction(&self) -> f64 {
        if self.random_range_percent.is_finite() {
            self.random_range_percent.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Computes a new order key for an item inserted between `prev` and `next`.
///
/// `None` for a neighbor means the insertion point has no item on that side:
/// `(None, Some(_))` is a head insertion, `(Some(_), None)` a tail append,
/// and `(None, None)` the first item of an empty list.
#[must_use]
pub fn calculate_position(prev: Option<i64>, next: Option<i64>, config: &PositionConfig) -> i64 {
    calculate_position_with(prev, next, config, &mut rand::rng())
}

/// Same as [`calculate_position`] but draws from a caller-supplied RNG,
/// which makes the randomized branches reproducible under a seeded source.
pub fn calculate_position_with<R: Rng + ?Sized>(
    prev: Option<i64>,
    next: Option<i64>,
    config: &PositionConfig,
    rng: &mut R,
) -> i64 {
    match (prev, next) {
        (Some(prev), Some(next)) => between(prev, next, config, rng),
        (None, Some(next)) => before_head(next, config, rng),
        (Some(prev), None) => after_tail(prev, config, rng),
        (None, None) => config.initial_position,
    }
}

/// Both neighbors present: randomize within the middle fraction of the gap,
/// or fall back to the exact midpoint when the gap is too small.
#[allow(clippy::cast_precision_loss)]
fn between<R: Rng + ?Sized>(prev: i64, next: i64, config: &PositionConfig, rng: &mut R) -> i64 {
    let gap = next - prev;
    if gap < MIN_RANDOM_GAP {
        return midpoint(prev, next);
    }
    let span = gap as f64 * config.range_fraction();
    let start = prev as f64 + (gap as f64 - span) / 2.0;
    floor_uniform(rng, start, start + span).clamp(prev + 1, next - 1)
}

/// Head insertion: a random key from a `default_spacing`-wide window ending
/// just below both zero and `next`, so the result always sorts before the
/// current head without touching any existing item.
fn before_head<R: Rng + ?Sized>(next: i64, config: &PositionConfig, rng: &mut R) -> i64 {
    let upper = next.saturating_sub(1).min(-1);
    upper - rng.random_range(0..config.spacing())
}

/// Tail append: `prev` plus a spacing step randomized around
/// `default_spacing`, never less than one.
#[allow(clippy::cast_precision_loss)]
fn after_tail<R: Rng + ?Sized>(prev: i64, config: &PositionConfig, rng: &mut R) -> i64 {
    let spacing = config.spacing() as f64;
    let half = spacing * config.range_fraction() / 2.0;
    let step = floor_uniform(rng, spacing - half, spacing + half).max(1);
    prev.saturating_add(step)
}

/// Floor of `(prev + next) / 2`, rounding toward negative infinity.
fn midpoint(prev: i64, next: i64) -> i64 {
    prev + (next - prev).div_euclid(2)
}

/// Floor of a uniform draw from `[lo, hi)`; degenerates to `floor(lo)` when
/// the range is empty (randomization disabled or zero-width span).
#[allow(clippy::cast_possible_truncation)]
fn floor_uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> i64 {
    if hi > lo {
        rng.random_range(lo..hi).floor() as i64
    } else {
        lo.floor() as i64
    }
}
