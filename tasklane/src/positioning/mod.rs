//! Order-key computation for concurrent list editing.
//!
//! Pure, synchronous functions with no shared state: safe to call from any
//! thread or event-loop tick without synchronization. Collision avoidance is
//! probabilistic (randomized sub-range selection); the deterministic
//! `(position, created_at, id)` composite order is the correctness backstop
//! when two clients do pick the same key.

pub mod adjacency;
pub mod calculator;
pub mod rebalance;

pub use adjacency::{Adjacent, adjacent_items};
pub use calculator::{MIN_RANDOM_GAP, PositionConfig, calculate_position, calculate_position_with};
pub use rebalance::{REBALANCE_THRESHOLD, needs_rebalancing, rebalance_positions};
