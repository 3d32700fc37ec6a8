//! Slot-selection engine.

/// Bounded memo of search results.
pub mod memo;
/// Backtracking search over section combinations.
pub mod search;
/// Cancellation seam and generation counters.
pub mod traits;
