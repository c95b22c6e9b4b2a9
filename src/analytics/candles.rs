// =============================================================================
// Candle Analyzer - moving averages, RSI, MACD, ATR and their interpretation
// =============================================================================
//
// Indicator columns are computed once at construction over the full,
// time-sorted series. Every operation afterwards reads the latest row.
//
// Trend rule:
//   bullish  = close > MA50 > MA200
//   bearish  = close < MA50 < MA200
//   sideways = anything else; unknown when MA50 or MA200 is undefined
//
// Volatility bands (ATR14 as % of close):  < 1 low,  1..3 moderate,  >= 3 high
// =============================================================================

use serde::Serialize;
use tracing::{debug, warn};

use super::{fmt_opt, fmt_time, AnalysisResult, Analyzer};
use crate::indicators::macd::MacdPoint;
use crate::indicators::rsi::RsiZone;
use crate::indicators::{atr, IndicatorFrame};
use crate::market_data::candle::{sort_by_time, Candle};

/// Default number of candles scanned for support / resistance.
pub const DEFAULT_LEVELS_LOOKBACK: usize = 50;

// =============================================================================
// Interpretation types
// =============================================================================

/// Support / resistance over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TechnicalLevels {
    pub support: f64,
    pub resistance: f64,
    pub recent_low: f64,
    pub recent_high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
    Unknown,
}

impl Trend {
    /// Total classification of `(close, MA50, MA200)`.
    pub fn classify(close: f64, ma50: Option<f64>, ma200: Option<f64>) -> Self {
        let (Some(ma50), Some(ma200)) = (ma50, ma200) else {
            return Self::Unknown;
        };
        if close > ma50 && ma50 > ma200 {
            Self::Bullish
        } else if close < ma50 && ma50 < ma200 {
            Self::Bearish
        } else {
            Self::Sideways
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Bullish => {
                "Price is above MA50 and MA50 is above MA200: a medium-term uptrend dominates."
            }
            Self::Bearish => {
                "Price is below MA50 and MA50 is below MA200: a medium-term downtrend dominates."
            }
            Self::Sideways => {
                "Price and moving averages are intertwined: likely a range or a trend change."
            }
            Self::Unknown => "Not enough data to judge the long-term trend (MA50/MA200).",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityRegime {
    Low,
    Moderate,
    High,
    Unknown,
}

impl VolatilityRegime {
    pub fn classify(atr_pct: Option<f64>) -> Self {
        match atr_pct {
            None => Self::Unknown,
            Some(p) if p < 1.0 => Self::Low,
            Some(p) if p < 3.0 => Self::Moderate,
            Some(_) => Self::High,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Volatility is low, price action is relatively calm.",
            Self::Moderate => "Volatility is moderate, moves are within normal bounds.",
            Self::High => "Volatility is high, moves are sharp and risk is elevated.",
            Self::Unknown => "Not enough data to assess volatility (ATR14).",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityInfo {
    pub atr: Option<f64>,
    pub atr_pct: Option<f64>,
    pub regime: VolatilityRegime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdMomentum {
    Bullish,
    Bearish,
    NoClearMomentum,
}

impl MacdMomentum {
    pub fn classify(point: &MacdPoint) -> Self {
        if point.histogram > 0.0 && point.macd > point.signal {
            Self::Bullish
        } else if point.histogram < 0.0 && point.macd < point.signal {
            Self::Bearish
        } else {
            Self::NoClearMomentum
        }
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Everything the candle narrative says, in structured form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSnapshot {
    pub symbol: String,
    pub interval: String,
    pub period_start: i64,
    pub period_end: i64,
    pub candles_count: usize,
    pub close: f64,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    pub rsi14: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub macd_momentum: Option<MacdMomentum>,
    pub trend: Trend,
    pub volatility_atr: Option<f64>,
    pub volatility_atr_pct: Option<f64>,
    pub volatility: VolatilityRegime,
    pub levels: Option<TechnicalLevels>,
}

// =============================================================================
// Analyzer
// =============================================================================

pub struct CandleAnalyzer {
    symbol: String,
    interval: String,
    candles: Vec<Candle>,
    frame: IndicatorFrame,
}

impl CandleAnalyzer {
    /// Take ownership of `candles`, sort them by time and compute every
    /// indicator column. `interval` is a display label only.
    pub fn new(
        symbol: impl Into<String>,
        mut candles: Vec<Candle>,
        interval: impl Into<String>,
    ) -> Self {
        let symbol = symbol.into();
        if !sort_by_time(&mut candles) {
            warn!(symbol = %symbol, "candles arrived out of order; re-sorted by open time");
        }
        let frame = IndicatorFrame::compute(&candles);
        Self {
            symbol,
            interval: interval.into(),
            candles,
            frame,
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Support = lowest low, resistance = highest high over the trailing
    /// `lookback` candles. `None` when fewer candles exist.
    pub fn levels(&self, lookback: usize) -> Option<TechnicalLevels> {
        if lookback == 0 || self.candles.len() < lookback {
            return None;
        }
        let recent = &self.candles[self.candles.len() - lookback..];
        let last = recent.last()?;
        let support = recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let resistance = recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);

        Some(TechnicalLevels {
            support,
            resistance,
            recent_low: last.low,
            recent_high: last.high,
        })
    }

    pub fn trend(&self) -> Trend {
        match (self.candles.last(), self.frame.last()) {
            (Some(candle), Some(row)) => Trend::classify(candle.close, row.ma50, row.ma200),
            _ => Trend::Unknown,
        }
    }

    pub fn volatility(&self) -> VolatilityInfo {
        let atr = self.frame.last().and_then(|row| row.atr14);
        let close = self.candles.last().map(|c| c.close);
        let atr_pct = match (atr, close) {
            (Some(a), Some(c)) => atr::atr_pct(a, c),
            _ => None,
        };
        VolatilityInfo {
            atr,
            atr_pct,
            regime: VolatilityRegime::classify(atr_pct),
        }
    }

    /// Structured view of the latest candle; `None` for an empty series.
    pub fn snapshot(&self) -> Option<CandleSnapshot> {
        let first = self.candles.first()?;
        let last = self.candles.last()?;
        let row = self.frame.last()?;
        let volatility = self.volatility();

        Some(CandleSnapshot {
            symbol: self.symbol.clone(),
            interval: self.interval.clone(),
            period_start: first.open_time,
            period_end: last.open_time,
            candles_count: self.candles.len(),
            close: last.close,
            ma20: row.ma20,
            ma50: row.ma50,
            ma200: row.ma200,
            rsi14: row.rsi14,
            rsi_zone: row.rsi14.map(RsiZone::classify),
            macd: row.macd.map(|m| m.macd),
            macd_signal: row.macd.map(|m| m.signal),
            macd_hist: row.macd.map(|m| m.histogram),
            macd_momentum: row.macd.as_ref().map(MacdMomentum::classify),
            trend: self.trend(),
            volatility_atr: volatility.atr,
            volatility_atr_pct: volatility.atr_pct,
            volatility: volatility.regime,
            levels: self.levels(DEFAULT_LEVELS_LOOKBACK),
        })
    }
}

impl Analyzer for CandleAnalyzer {
    fn section(&self) -> &'static str {
        "candles"
    }

    fn analyze(&self) -> AnalysisResult {
        match self.snapshot() {
            Some(snapshot) => {
                debug!(
                    symbol = %self.symbol,
                    candles = snapshot.candles_count,
                    trend = ?snapshot.trend,
                    "candle analysis complete"
                );
                AnalysisResult::from_payload(render(&snapshot), &snapshot)
            }
            None => {
                debug!(symbol = %self.symbol, "candle analysis skipped: empty series");
                AnalysisResult::degraded(format!("Analysis for {}: no data.", self.symbol))
            }
        }
    }
}

// =============================================================================
// Narrative
// =============================================================================

fn rsi_text(rsi: Option<f64>) -> String {
    match rsi {
        None => "RSI: not enough data.".to_string(),
        Some(v) => match RsiZone::classify(v) {
            RsiZone::Overbought => {
                format!("RSI ~ {v:.1}: overbought zone, pullback risk is elevated.")
            }
            RsiZone::Oversold => format!("RSI ~ {v:.1}: oversold zone, a bounce is possible."),
            RsiZone::Neutral => {
                format!("RSI ~ {v:.1}: neutral zone, neither overbought nor oversold.")
            }
        },
    }
}

fn macd_text(momentum: Option<MacdMomentum>) -> &'static str {
    match momentum {
        None => "MACD: not enough data.",
        Some(MacdMomentum::Bullish) => {
            "MACD is above the signal line with a positive histogram: bullish momentum."
        }
        Some(MacdMomentum::Bearish) => {
            "MACD is below the signal line with a negative histogram: bearish momentum."
        }
        Some(MacdMomentum::NoClearMomentum) => {
            "MACD is near the signal line: no clear momentum, possible consolidation."
        }
    }
}

/// Render the candle narrative from its payload.
pub fn render(s: &CandleSnapshot) -> String {
    let levels_text = match &s.levels {
        Some(l) => format!(
            "Support ~{:.2}, resistance ~{:.2}.",
            l.support, l.resistance
        ),
        None => "Not enough data to identify levels with confidence.".to_string(),
    };

    let volatility_text = match (s.volatility_atr, s.volatility_atr_pct) {
        (Some(atr), Some(pct)) => format!(
            "Volatility (ATR14): {atr:.3} (~{pct:.2}% of price). {}",
            s.volatility.description()
        ),
        _ => format!("Volatility (ATR14): n/a. {}", s.volatility.description()),
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Analysis for {} (TF {}, candles: {})\n",
        s.symbol, s.interval, s.candles_count
    ));
    out.push_str(&format!(
        "Period: {} → {}\n\n",
        fmt_time(s.period_start),
        fmt_time(s.period_end)
    ));
    out.push_str(&format!("- Close: {:.2} USDT\n", s.close));
    out.push_str(&format!("- {}\n", s.trend.description()));
    out.push_str(&format!(
        "- MA20: {}, MA50: {}, MA200: {}\n",
        fmt_opt(s.ma20, 2),
        fmt_opt(s.ma50, 2),
        fmt_opt(s.ma200, 2)
    ));
    out.push_str(&format!("- {}\n", rsi_text(s.rsi14)));
    out.push_str(&format!("- {}\n", macd_text(s.macd_momentum)));
    out.push_str(&format!("- Levels: {levels_text}\n"));
    out.push_str(&format!("- {volatility_text}"));
    out
}
