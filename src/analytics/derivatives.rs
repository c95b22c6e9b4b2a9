// =============================================================================
// Derivatives Analyzer - funding rate and open interest change
// =============================================================================
//
// Funding regimes:
//   rate > +0.0005  =>  longs crowded, expensive to hold longs
//   rate < -0.0005  =>  shorts crowded, expensive to hold shorts
//   otherwise       =>  neutral
//
// Open interest change over the observed period:
//   > +5%  =>  new capital entering, move strengthening
//   < -5%  =>  positions unwinding, move may be exhausting

use serde::Serialize;
use tracing::debug;

use super::{fmt_grouped, AnalysisResult, Analyzer};
use crate::market_data::derivatives::{earliest_by, latest_by};
use crate::market_data::{FundingObservation, OpenInterestObservation};

pub const FUNDING_THRESHOLD: f64 = 0.0005;
pub const OI_CHANGE_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingRegime {
    LongsCrowded,
    ShortsCrowded,
    Neutral,
}

impl FundingRegime {
    pub fn classify(rate: f64) -> Self {
        if rate > FUNDING_THRESHOLD {
            Self::LongsCrowded
        } else if rate < -FUNDING_THRESHOLD {
            Self::ShortsCrowded
        } else {
            Self::Neutral
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::LongsCrowded => {
                "High positive funding: the market is skewed to longs, holding longs is expensive."
            }
            Self::ShortsCrowded => {
                "Strongly negative funding: the market is skewed to shorts, holding shorts is expensive."
            }
            Self::Neutral => "Funding is near zero: no strong skew to either side.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenInterestRegime {
    Inflow,
    Unwind,
    Stable,
}

impl OpenInterestRegime {
    pub fn classify(change_pct: f64) -> Self {
        if change_pct > OI_CHANGE_THRESHOLD_PCT {
            Self::Inflow
        } else if change_pct < -OI_CHANGE_THRESHOLD_PCT {
            Self::Unwind
        } else {
            Self::Stable
        }
    }

    fn describe(&self) -> Option<&'static str> {
        match self {
            Self::Inflow => Some("Rising OI: new capital is entering, the move is strengthening."),
            Self::Unwind => {
                Some("Falling OI: positions are being closed, the move may be running out of steam.")
            }
            Self::Stable => None,
        }
    }
}

/// Last open interest and its change across the observed period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpenInterestInfo {
    pub oi: Option<f64>,
    pub oi_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivativesSummary {
    pub symbol: String,
    pub funding_rate: Option<f64>,
    pub funding_regime: Option<FundingRegime>,
    pub oi: Option<f64>,
    pub oi_change_pct: Option<f64>,
    pub oi_regime: Option<OpenInterestRegime>,
}

pub struct DerivativesAnalyzer {
    symbol: String,
    funding: Option<Vec<FundingObservation>>,
    open_interest: Option<Vec<OpenInterestObservation>>,
}

impl DerivativesAnalyzer {
    pub fn new(
        symbol: impl Into<String>,
        funding: Option<Vec<FundingObservation>>,
        open_interest: Option<Vec<OpenInterestObservation>>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            funding,
            open_interest,
        }
    }

    /// Most recent funding rate by timestamp.
    pub fn last_funding(&self) -> Option<f64> {
        let series = self.funding.as_deref()?;
        latest_by(series, |f| f.time).map(|f| f.funding_rate)
    }

    /// Latest OI level and the percentage change from the earliest
    /// observation. The change is `None` with fewer than two observations or
    /// a non-positive starting value.
    pub fn oi_info(&self) -> OpenInterestInfo {
        let Some(series) = self.open_interest.as_deref() else {
            return OpenInterestInfo { oi: None, oi_change_pct: None };
        };
        let last = latest_by(series, |o| o.time).map(|o| o.open_interest);
        let first = earliest_by(series, |o| o.time).map(|o| o.open_interest);

        let oi_change_pct = match (first, last) {
            (Some(first), Some(last)) if series.len() >= 2 && first > 0.0 => {
                Some((last - first) / first * 100.0)
            }
            _ => None,
        };

        OpenInterestInfo { oi: last, oi_change_pct }
    }

    pub fn summary(&self) -> DerivativesSummary {
        let funding_rate = self.last_funding();
        let info = self.oi_info();
        DerivativesSummary {
            symbol: self.symbol.clone(),
            funding_rate,
            funding_regime: funding_rate.map(FundingRegime::classify),
            oi: info.oi,
            oi_change_pct: info.oi_change_pct,
            oi_regime: info.oi_change_pct.map(OpenInterestRegime::classify),
        }
    }
}

impl Analyzer for DerivativesAnalyzer {
    fn section(&self) -> &'static str {
        "derivatives"
    }

    fn analyze(&self) -> AnalysisResult {
        let summary = self.summary();
        debug!(
            symbol = %self.symbol,
            funding = ?summary.funding_rate,
            oi_change_pct = ?summary.oi_change_pct,
            "derivatives analysis complete"
        );
        AnalysisResult::from_payload(render(&summary), &summary)
    }
}

/// Render the derivatives narrative from its payload.
pub fn render(s: &DerivativesSummary) -> String {
    let mut lines = vec![format!("Derivatives for {}:", s.symbol)];

    match (s.funding_rate, s.funding_regime) {
        (Some(rate), Some(regime)) => {
            lines.push(format!("- Funding rate (latest): {:.4}%.", rate * 100.0));
            lines.push(format!("  {}", regime.describe()));
        }
        _ => lines.push("- Funding rate: no data.".to_string()),
    }

    match s.oi {
        None => lines.push("- Open interest: not enough data.".to_string()),
        Some(oi) => {
            let mut line = format!("- Open interest (latest): {} contracts.", fmt_grouped(oi));
            if let Some(change) = s.oi_change_pct {
                line.push_str(&format!(" Change over the period: {change:.2}%."));
                if let Some(text) = s.oi_regime.and_then(|r| r.describe()) {
                    line.push(' ');
                    line.push_str(text);
                }
            }
            lines.push(line);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funding(time: i64, rate: f64) -> FundingObservation {
        FundingObservation { time, funding_rate: rate }
    }

    fn oi(time: i64, value: f64) -> OpenInterestObservation {
        OpenInterestObservation { time, open_interest: value }
    }

    #[test]
    fn absent_series_yield_no_data() {
        let analyzer = DerivativesAnalyzer::new("X", None, None);
        assert!(analyzer.last_funding().is_none());
        let result = analyzer.analyze();
        assert!(result.summary().contains("Funding rate: no data."));
        assert!(result.summary().contains("Open interest: not enough data."));
        assert_eq!(result.data()["funding_rate"], serde_json::Value::Null);
    }

    #[test]
    fn empty_funding_series_is_none() {
        let analyzer = DerivativesAnalyzer::new("X", Some(Vec::new()), None);
        assert!(analyzer.last_funding().is_none());
    }

    #[test]
    fn funding_takes_latest_by_timestamp() {
        let series = vec![funding(300, 0.0010), funding(100, -0.0010), funding(200, 0.0)];
        let analyzer = DerivativesAnalyzer::new("X", Some(series), None);
        assert_eq!(analyzer.last_funding(), Some(0.0010));
    }

    #[test]
    fn funding_regimes() {
        assert_eq!(FundingRegime::classify(0.0006), FundingRegime::LongsCrowded);
        assert_eq!(FundingRegime::classify(0.0005), FundingRegime::Neutral);
        assert_eq!(FundingRegime::classify(-0.0005), FundingRegime::Neutral);
        assert_eq!(FundingRegime::classify(-0.0006), FundingRegime::ShortsCrowded);
    }

    #[test]
    fn oi_change_from_first_to_last() {
        let series = vec![oi(200, 110.0), oi(100, 100.0)];
        let info = DerivativesAnalyzer::new("X", None, Some(series)).oi_info();
        assert_eq!(info.oi, Some(110.0));
        assert!((info.oi_change_pct.unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn oi_single_observation_has_level_but_no_change() {
        let info = DerivativesAnalyzer::new("X", None, Some(vec![oi(1, 500.0)])).oi_info();
        assert_eq!(info.oi, Some(500.0));
        assert!(info.oi_change_pct.is_none());
    }

    #[test]
    fn oi_non_positive_start_has_no_change() {
        let series = vec![oi(1, 0.0), oi(2, 100.0)];
        let info = DerivativesAnalyzer::new("X", None, Some(series)).oi_info();
        assert_eq!(info.oi, Some(100.0));
        assert!(info.oi_change_pct.is_none());
    }

    #[test]
    fn oi_regimes() {
        assert_eq!(OpenInterestRegime::classify(5.1), OpenInterestRegime::Inflow);
        assert_eq!(OpenInterestRegime::classify(5.0), OpenInterestRegime::Stable);
        assert_eq!(OpenInterestRegime::classify(-5.1), OpenInterestRegime::Unwind);
    }

    #[test]
    fn narrative_combines_both_sections() {
        let analyzer = DerivativesAnalyzer::new(
            "BTCUSDT",
            Some(vec![funding(1, 0.0008)]),
            Some(vec![oi(1, 1_000_000.0), oi(2, 1_100_000.0)]),
        );
        let result = analyzer.analyze();
        let text = result.summary();
        assert!(text.contains("Funding rate (latest): 0.0800%."));
        assert!(text.contains("skewed to longs"));
        assert!(text.contains("1,100,000 contracts"));
        assert!(text.contains("Change over the period: 10.00%."));
        assert!(text.contains("new capital is entering"));
        assert_eq!(result.data()["oi_regime"], "inflow");
        assert_eq!(result.data()["funding_regime"], "longs_crowded");
    }
}
