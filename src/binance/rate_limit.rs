// =============================================================================
// Request-Weight Tracker - watches Binance API usage to avoid 429s
// =============================================================================
//
// Binance reports the request weight consumed in the current minute through
// the `X-MBX-USED-WEIGHT-1M` response header (1200 per minute on spot). The
// tracker records the latest value and warns once usage crosses 800.
// =============================================================================

use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

pub const WEIGHT_HEADER: &str = "X-MBX-USED-WEIGHT-1M";

/// Per-minute request weight granted by Binance.
const WEIGHT_LIMIT: u32 = 1200;
/// Soft warning threshold.
const WEIGHT_WARN_THRESHOLD: u32 = 800;

/// Lock-free holder of the last reported request weight.
pub struct WeightTracker {
    used_weight_1m: AtomicU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeightSnapshot {
    pub used_weight_1m: u32,
    pub limit: u32,
    pub near_limit: bool,
}

impl WeightTracker {
    pub fn new() -> Self {
        Self {
            used_weight_1m: AtomicU32::new(0),
        }
    }

    /// Update the counter from response headers. Missing or malformed headers
    /// leave the previous value untouched.
    pub fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let Some(w) = headers
            .get(WEIGHT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok())
        else {
            return;
        };
        self.record(w);
    }

    fn record(&self, w: u32) {
        let prev = self.used_weight_1m.swap(w, Ordering::Relaxed);
        if w >= WEIGHT_WARN_THRESHOLD && prev < WEIGHT_WARN_THRESHOLD {
            warn!(
                used_weight = w,
                limit = WEIGHT_LIMIT,
                "request weight crossed warning threshold"
            );
        }
        debug!(used_weight_1m = w, "request weight updated from header");
    }

    /// Last reported weight, flagged once it reaches the warning threshold.
    pub fn snapshot(&self) -> WeightSnapshot {
        let used = self.used_weight_1m.load(Ordering::Relaxed);
        WeightSnapshot {
            used_weight_1m: used,
            limit: WEIGHT_LIMIT,
            near_limit: used >= WEIGHT_WARN_THRESHOLD,
        }
    }
}

impl Default for WeightTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WeightTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightTracker")
            .field("used_weight_1m", &self.used_weight_1m.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn reads_weight_header() {
        let tracker = WeightTracker::new();
        let mut headers = HeaderMap::new();
        headers.insert(WEIGHT_HEADER, HeaderValue::from_static("42"));
        tracker.update_from_headers(&headers);
        assert_eq!(tracker.snapshot().used_weight_1m, 42);
        assert!(!tracker.snapshot().near_limit);
    }

    #[test]
    fn malformed_header_keeps_previous_value() {
        let tracker = WeightTracker::new();
        let mut headers = HeaderMap::new();
        headers.insert(WEIGHT_HEADER, HeaderValue::from_static("900"));
        tracker.update_from_headers(&headers);
        headers.insert(WEIGHT_HEADER, HeaderValue::from_static("lots"));
        tracker.update_from_headers(&headers);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.used_weight_1m, 900);
        assert!(snapshot.near_limit);
    }

    #[test]
    fn absent_header_is_ignored() {
        let tracker = WeightTracker::new();
        tracker.update_from_headers(&HeaderMap::new());
        assert_eq!(tracker.snapshot().used_weight_1m, 0);
    }
}
