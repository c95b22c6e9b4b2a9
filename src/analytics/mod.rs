// =============================================================================
// Analytics - stateless analyzers producing narrative + structured payload
// =============================================================================
//
// Every analyzer owns its own copy of the input tables and exposes a single
// `analyze` operation through the `Analyzer` trait. Results are immutable once
// built. Narratives are rendered from the same summary struct that is
// serialised into the payload, so the text never claims a number the payload
// does not carry.

pub mod candles;
pub mod correlation;
pub mod derivatives;
pub mod orderbook;
pub mod report;
pub mod volume_flow;

pub use candles::CandleAnalyzer;
pub use correlation::CorrelationAnalyzer;
pub use derivatives::DerivativesAnalyzer;
pub use orderbook::OrderBookAnalyzer;
pub use report::{ReportBuilder, ReportSection, StructuredReport};
pub use volume_flow::VolumeFlowAnalyzer;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Human-readable summary paired with the named fields it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    summary: String,
    data: Map<String, Value>,
}

impl AnalysisResult {
    pub fn new(summary: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            summary: summary.into(),
            data,
        }
    }

    /// A result with a narrative only and an empty payload.
    pub fn degraded(summary: impl Into<String>) -> Self {
        Self::new(summary, Map::new())
    }

    /// Build a result whose payload is the serialised form of `payload`.
    ///
    /// Structs that serialise to anything other than a JSON object end up as
    /// a single `value` field.
    pub fn from_payload<T: Serialize>(summary: impl Into<String>, payload: &T) -> Self {
        let data = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Err(e) => {
                warn!(error = %e, "analysis payload could not be serialised; dropped");
                Map::new()
            }
            Ok(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self::new(summary, data)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Convenience accessor for numeric payload fields.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }
}

/// A self-contained analysis over tables the analyzer already owns.
pub trait Analyzer: Send + Sync {
    /// Section tag used when the result is placed into a report.
    fn section(&self) -> &'static str;

    /// Run the analysis. Never fails: inadequate input yields a degraded but
    /// valid result.
    fn analyze(&self) -> AnalysisResult;
}

// =============================================================================
// Number formatting shared by the narratives
// =============================================================================

/// `{:.prec$}` for defined values, `n/a` otherwise.
pub(crate) fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.precision$}"),
        _ => "n/a".to_string(),
    }
}

/// Round to an integer and group thousands with commas (`1234567.8` =>
/// `1,234,568`).
pub(crate) fn fmt_grouped(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format a UNIX-millisecond timestamp as `YYYY-MM-DD HH:MM` (UTC).
pub(crate) fn fmt_time(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}
