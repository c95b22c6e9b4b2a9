// =============================================================================
// Perpetual futures observations: funding rate and open interest
// =============================================================================

use serde::{Deserialize, Serialize};

/// One settled funding rate, as a decimal (0.0001 = 0.01%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingObservation {
    pub time: i64,
    pub funding_rate: f64,
}

/// Open interest in contracts at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestObservation {
    pub time: i64,
    pub open_interest: f64,
}

/// Latest observation by timestamp. Ties resolve to the later element, the
/// same as a stable sort followed by taking the last row.
pub fn latest_by<T: Copy>(items: &[T], time: impl Fn(&T) -> i64) -> Option<T> {
    items.iter().copied().max_by_key(|item| time(item))
}

/// Earliest observation by timestamp. Ties resolve to the earlier element.
pub fn earliest_by<T: Copy>(items: &[T], time: impl Fn(&T) -> i64) -> Option<T> {
    items.iter().copied().min_by_key(|item| time(item))
}
