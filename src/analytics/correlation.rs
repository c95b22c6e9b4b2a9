// =============================================================================
// Correlation Analyzer - return correlation against benchmark series
// =============================================================================
//
// For each benchmark:
//   1. Inner-join primary and benchmark closes on open time.
//   2. Keep the trailing `effective_window` joined rows, where
//      effective_window = min(window, primary length).
//   3. Percentage returns on both sides (the first row has no prior value).
//   4. Pearson correlation of the paired returns.
//
// Gaps in either upstream series shrink the joined series, so the number of
// returns can be smaller than the requested window.
// =============================================================================

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{fmt_time, AnalysisResult, Analyzer};
use crate::market_data::candle::{sort_by_time, Candle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationBand {
    VeryHighPositive,
    StrongPositive,
    ModeratePositive,
    WeakOrNone,
    ModerateNegative,
    StrongNegative,
}

impl CorrelationBand {
    pub fn classify(corr: f64) -> Self {
        if corr >= 0.75 {
            Self::VeryHighPositive
        } else if corr >= 0.50 {
            Self::StrongPositive
        } else if corr >= 0.25 {
            Self::ModeratePositive
        } else if corr > -0.25 {
            Self::WeakOrNone
        } else if corr > -0.50 {
            Self::ModerateNegative
        } else {
            Self::StrongNegative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryHighPositive => "very high positive correlation",
            Self::StrongPositive => "strong positive correlation",
            Self::ModeratePositive => "moderate positive correlation",
            Self::WeakOrNone => "weak or no correlation",
            Self::ModerateNegative => "moderate negative correlation",
            Self::StrongNegative => "strong negative correlation",
        }
    }
}

/// What happened to one benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BenchmarkOutcome {
    Correlated { value: f64, band: CorrelationBand },
    InsufficientCommonData,
    CannotCompute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReading {
    pub name: String,
    pub outcome: BenchmarkOutcome,
}

/// Full structured view behind the correlation narrative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub symbol: String,
    pub interval: String,
    pub effective_window: usize,
    pub period_start: i64,
    pub period_end: i64,
    pub benchmarks: Vec<BenchmarkReading>,
}

impl CorrelationSummary {
    /// Benchmark name => correlation, for successfully computed benchmarks
    /// only, in benchmark order.
    pub fn correlations(&self) -> Vec<(&str, f64)> {
        self.benchmarks
            .iter()
            .filter_map(|b| match b.outcome {
                BenchmarkOutcome::Correlated { value, .. } => Some((b.name.as_str(), value)),
                _ => None,
            })
            .collect()
    }
}

pub struct CorrelationAnalyzer {
    symbol: String,
    primary: Vec<Candle>,
    benchmarks: Vec<(String, Vec<Candle>)>,
    window: usize,
    interval: String,
}

impl CorrelationAnalyzer {
    /// `benchmarks` keeps its iteration order in the narrative.
    pub fn new(
        symbol: impl Into<String>,
        mut primary: Vec<Candle>,
        benchmarks: impl IntoIterator<Item = (String, Vec<Candle>)>,
        window: usize,
        interval: impl Into<String>,
    ) -> Self {
        let symbol = symbol.into();
        if !sort_by_time(&mut primary) {
            warn!(symbol = %symbol, "candles arrived out of order; re-sorted by open time");
        }
        let benchmarks = benchmarks
            .into_iter()
            .map(|(name, mut candles)| {
                if !sort_by_time(&mut candles) {
                    warn!(
                        symbol = %symbol,
                        benchmark = %name,
                        "benchmark candles arrived out of order; re-sorted by open time"
                    );
                }
                (name, candles)
            })
            .collect();
        Self {
            symbol,
            primary,
            benchmarks,
            window,
            interval: interval.into(),
        }
    }

    /// `None` when the primary series is empty or shorter than two candles
    /// inside the window.
    pub fn summary(&self) -> Option<CorrelationSummary> {
        let effective_window = self.window.min(self.primary.len());
        if effective_window < 2 {
            return None;
        }
        let start = self.primary.len() - effective_window;
        let period_start = self.primary[start].open_time;
        let period_end = self.primary.last()?.open_time;

        let benchmarks = self
            .benchmarks
            .iter()
            .map(|(name, candles)| BenchmarkReading {
                name: name.clone(),
                outcome: self.evaluate(candles, effective_window),
            })
            .collect();

        Some(CorrelationSummary {
            symbol: self.symbol.clone(),
            interval: self.interval.clone(),
            effective_window,
            period_start,
            period_end,
            benchmarks,
        })
    }

    fn evaluate(&self, benchmark: &[Candle], effective_window: usize) -> BenchmarkOutcome {
        let joined = inner_join(&self.primary, benchmark);
        if joined.len() < 2 {
            return BenchmarkOutcome::InsufficientCommonData;
        }

        let tail = &joined[joined.len().saturating_sub(effective_window)..];
        let pairs = paired_returns(tail);
        match pearson(&pairs) {
            Some(value) => BenchmarkOutcome::Correlated {
                value,
                band: CorrelationBand::classify(value),
            },
            None => BenchmarkOutcome::CannotCompute,
        }
    }
}

impl Analyzer for CorrelationAnalyzer {
    fn section(&self) -> &'static str {
        "correlation"
    }

    fn analyze(&self) -> AnalysisResult {
        if self.primary.is_empty() {
            debug!(symbol = %self.symbol, "correlation skipped: empty primary series");
            return AnalysisResult::degraded(format!("Correlations for {}: no data.", self.symbol));
        }
        let Some(summary) = self.summary() else {
            debug!(symbol = %self.symbol, "correlation skipped: window shorter than 2");
            return AnalysisResult::degraded(format!(
                "Correlations for {}: insufficient data.",
                self.symbol
            ));
        };

        let mut data = Map::new();
        for (name, value) in summary.correlations() {
            data.insert(name.to_string(), Value::from(value));
        }
        debug!(
            symbol = %self.symbol,
            window = summary.effective_window,
            computed = data.len(),
            "correlation analysis complete"
        );
        AnalysisResult::new(render(&summary), data)
    }
}

// =============================================================================
// Alignment and statistics
// =============================================================================

/// Primary/benchmark close pairs on shared timestamps, in primary order.
/// Rows where either close is not finite are dropped.
pub fn inner_join(primary: &[Candle], benchmark: &[Candle]) -> Vec<(f64, f64)> {
    let by_time: HashMap<i64, f64> = benchmark
        .iter()
        .filter(|c| c.close.is_finite())
        .map(|c| (c.open_time, c.close))
        .collect();

    primary
        .iter()
        .filter(|c| c.close.is_finite())
        .filter_map(|c| by_time.get(&c.open_time).map(|&b| (c.close, b)))
        .collect()
}

/// Percentage returns of both columns, keeping only rows where both returns
/// are defined.
pub fn paired_returns(rows: &[(f64, f64)]) -> Vec<(f64, f64)> {
    rows.windows(2)
        .filter_map(|w| {
            let (p0, b0) = w[0];
            let (p1, b1) = w[1];
            let pr = pct_change(p0, p1)?;
            let br = pct_change(b0, b1)?;
            Some((pr, br))
        })
        .collect()
}

fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        return None;
    }
    let r = (curr - prev) / prev;
    r.is_finite().then_some(r)
}

/// Pearson correlation of paired samples. `None` with fewer than two pairs or
/// when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let corr = cov / (var_x.sqrt() * var_y.sqrt());
    corr.is_finite().then(|| corr.clamp(-1.0, 1.0))
}

// =============================================================================
// Narrative
// =============================================================================

/// Render the correlation narrative.
pub fn render(s: &CorrelationSummary) -> String {
    let mut lines = vec![
        format!(
            "Correlations of {} with benchmarks (last {} candles, TF {})",
            s.symbol, s.effective_window, s.interval
        ),
        format!(
            "Period: {} → {}",
            fmt_time(s.period_start),
            fmt_time(s.period_end)
        ),
        String::new(),
    ];

    for reading in &s.benchmarks {
        let line = match reading.outcome {
            BenchmarkOutcome::Correlated { value, band } => {
                format!("- {}: correlation {:.2} ({})", reading.name, value, band.label())
            }
            BenchmarkOutcome::InsufficientCommonData => {
                format!("- {}: insufficient common data.", reading.name)
            }
            BenchmarkOutcome::CannotCompute => {
                format!("- {}: cannot compute correlation.", reading.name)
            }
        };
        lines.push(line);
    }

    if s.correlations().is_empty() {
        lines.push(String::new());
        lines.push("Insufficient data overall to compute correlations.".to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;

    fn series(closes: &[f64]) -> Vec<Candle> {
        series_at(closes, 0)
    }

    fn series_at(closes: &[f64], offset: i64) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new((i as i64 + offset) * HOUR_MS, c, c, c, c, 1.0))
            .collect()
    }

    #[test]
    fn identical_series_correlate_perfectly() {
        let closes = [100.0, 105.0, 110.0];
        let analyzer = CorrelationAnalyzer::new(
            "SOLUSDT",
            series(&closes),
            vec![("BTCUSDT".to_string(), series(&closes))],
            3,
            "1h",
        );
        let result = analyzer.analyze();
        assert!((result.number("BTCUSDT").unwrap() - 1.0).abs() < 1e-9);
        assert!(result
            .summary()
            .contains("- BTCUSDT: correlation 1.00 (very high positive correlation)"));
    }

    #[test]
    fn negated_returns_correlate_negatively() {
        let primary = series(&[100.0, 110.0, 99.0, 108.9]);
        let mirror = series(&[100.0, 90.0, 99.0, 89.1]);
        let result =
            CorrelationAnalyzer::new("X", primary, vec![("M".to_string(), mirror)], 10, "1h")
                .analyze();
        assert!((result.number("M").unwrap() + 1.0).abs() < 1e-9);
        assert!(result.summary().contains("strong negative correlation"));
    }

    #[test]
    fn empty_primary_is_no_data() {
        let benchmarks = vec![("B".to_string(), series(&[1.0, 2.0]))];
        let result = CorrelationAnalyzer::new("X", Vec::new(), benchmarks, 10, "1h").analyze();
        assert_eq!(result.summary(), "Correlations for X: no data.");
        assert!(result.data().is_empty());
    }

    #[test]
    fn window_below_two_is_insufficient() {
        let result =
            CorrelationAnalyzer::new("X", series(&[1.0, 2.0, 3.0]), Vec::new(), 1, "1h").analyze();
        assert_eq!(result.summary(), "Correlations for X: insufficient data.");
        assert!(result.data().is_empty());
    }

    #[test]
    fn disjoint_timestamps_are_skipped() {
        let primary = series(&[1.0, 2.0, 3.0]);
        let other = series_at(&[1.0, 2.0, 3.0], 100);
        let benchmarks = vec![("B".to_string(), other)];
        let result = CorrelationAnalyzer::new("X", primary, benchmarks, 10, "1h").analyze();
        assert!(result.summary().contains("- B: insufficient common data."));
        assert!(result.summary().contains("Insufficient data overall"));
        assert!(result.data().is_empty());
    }

    #[test]
    fn flat_benchmark_cannot_compute() {
        let primary = series(&[1.0, 2.0, 4.0]);
        let flat = series(&[5.0, 5.0, 5.0]);
        let benchmarks = vec![("F".to_string(), flat)];
        let result = CorrelationAnalyzer::new("X", primary, benchmarks, 10, "1h").analyze();
        assert!(result.summary().contains("- F: cannot compute correlation."));
        assert!(!result.data().contains_key("F"));
    }

    #[test]
    fn benchmarks_keep_insertion_order() {
        let closes = [100.0, 101.0, 99.0, 102.0];
        let analyzer = CorrelationAnalyzer::new(
            "X",
            series(&closes),
            vec![
                ("ZZZ".to_string(), series(&closes)),
                ("AAA".to_string(), series(&[1.0])),
            ],
            10,
            "1h",
        );
        let text = analyzer.analyze().summary().to_string();
        let z = text.find("ZZZ").unwrap();
        let a = text.find("AAA").unwrap();
        assert!(z < a);
        assert!(!text.contains("Insufficient data overall"));
    }

    #[test]
    fn trailing_window_applies_to_joined_rows() {
        // Joined rows exist only at t=0..3; window 3 keeps the last three.
        let primary = series(&[100.0, 50.0, 60.0, 70.0, 80.0]);
        let bench = series(&[100.0, 200.0, 210.0, 220.0]);
        let joined = inner_join(&primary, &bench);
        assert_eq!(joined.len(), 4);
        let summary =
            CorrelationAnalyzer::new("X", primary, vec![("B".to_string(), bench)], 3, "1h")
                .summary()
                .unwrap();
        assert_eq!(summary.effective_window, 3);
        assert!(matches!(
            summary.benchmarks[0].outcome,
            BenchmarkOutcome::Correlated { .. }
        ));
    }

    #[test]
    fn effective_window_is_capped_by_primary_length() {
        let summary = CorrelationAnalyzer::new("X", series(&[1.0, 2.0, 3.0]), Vec::new(), 100, "1h")
            .summary()
            .unwrap();
        assert_eq!(summary.effective_window, 3);
        assert_eq!(summary.period_start, 0);
        assert_eq!(summary.period_end, 2 * HOUR_MS);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(CorrelationBand::classify(0.75), CorrelationBand::VeryHighPositive);
        assert_eq!(CorrelationBand::classify(0.5), CorrelationBand::StrongPositive);
        assert_eq!(CorrelationBand::classify(0.25), CorrelationBand::ModeratePositive);
        assert_eq!(CorrelationBand::classify(-0.25), CorrelationBand::ModerateNegative);
        assert_eq!(CorrelationBand::classify(-0.2), CorrelationBand::WeakOrNone);
        assert_eq!(CorrelationBand::classify(-0.5), CorrelationBand::StrongNegative);
    }

    #[test]
    fn pearson_requires_two_pairs() {
        assert!(pearson(&[(0.1, 0.2)]).is_none());
    }

    #[test]
    fn zero_price_returns_are_skipped() {
        let pairs = paired_returns(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn out_of_order_input_is_resorted() {
        let closes = [100.0, 104.0, 101.0, 107.0];
        let bench = [50.0, 51.0, 49.0, 53.0];
        let mut primary = series(&closes);
        let mut shuffled = series(&bench);
        primary.reverse();
        shuffled.swap(0, 2);

        let sorted = CorrelationAnalyzer::new(
            "X",
            series(&closes),
            vec![("B".to_string(), series(&bench))],
            10,
            "1h",
        )
        .analyze();
        let resorted =
            CorrelationAnalyzer::new("X", primary, vec![("B".to_string(), shuffled)], 10, "1h")
                .analyze();
        assert_eq!(sorted, resorted);
        assert!(resorted.number("B").is_some());
    }
}
