// =============================================================================
// Report Builder - ordered composition of analyzer results
// =============================================================================
//
// Purely additive: sections appear in append order, nothing is deduplicated
// or validated across sections.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{AnalysisResult, Analyzer};

pub const DISCLAIMER: &str = "⚠️ Not investment advice, just a technical overview.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub section: String,
    pub summary: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructuredReport {
    pub report_id: String,
    pub generated_at: String,
    pub symbol: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone)]
pub struct ReportBuilder {
    symbol: String,
    sections: Vec<(String, AnalysisResult)>,
}

impl ReportBuilder {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sections: Vec::new(),
        }
    }

    /// Run `analyzer` and append its result.
    pub fn add(self, analyzer: &dyn Analyzer) -> Self {
        let section = analyzer.section();
        self.add_result(section, analyzer.analyze())
    }

    /// Append an already computed result under `section`.
    pub fn add_result(mut self, section: impl Into<String>, result: AnalysisResult) -> Self {
        self.sections.push((section.into(), result));
        self
    }

    pub fn add_all(self, analyzers: &[&dyn Analyzer]) -> Self {
        analyzers.iter().fold(self, |builder, a| builder.add(*a))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn build_text(&self) -> String {
        let mut parts = Vec::with_capacity(self.sections.len() + 2);
        parts.push(format!("Combined report for {}:", self.symbol));
        parts.extend(self.sections.iter().map(|(_, r)| r.summary().to_string()));
        parts.push(DISCLAIMER.to_string());
        parts.join("\n\n")
    }

    pub fn build_structured(&self) -> StructuredReport {
        StructuredReport {
            report_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now().to_rfc3339(),
            symbol: self.symbol.clone(),
            sections: self
                .sections
                .iter()
                .map(|(section, r)| ReportSection {
                    section: section.clone(),
                    summary: r.summary().to_string(),
                    data: r.data().clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{OrderBookAnalyzer, VolumeFlowAnalyzer};
    use crate::market_data::{BookLevel, Trade, TradeSide};

    #[test]
    fn empty_report_has_header_and_footer() {
        let text = ReportBuilder::new("BTCUSDT").build_text();
        assert_eq!(text, format!("Combined report for BTCUSDT:\n\n{DISCLAIMER}"));
    }

    #[test]
    fn sections_keep_append_order() {
        let book = OrderBookAnalyzer::new(
            "X",
            vec![BookLevel::new(100.0, 10.0)],
            vec![BookLevel::new(101.0, 10.0)],
        );
        let flow = VolumeFlowAnalyzer::new("X", vec![Trade::new(1, 100.0, 1.0, TradeSide::Buy)]);

        let builder = ReportBuilder::new("X")
            .add(&flow)
            .add(&book)
            .add_result("note", AnalysisResult::degraded("manual"));
        assert_eq!(builder.len(), 3);

        let report = builder.build_structured();
        let names: Vec<_> = report.sections.iter().map(|s| s.section.as_str()).collect();
        assert_eq!(names, ["volume", "orderbook", "note"]);
        assert_eq!(report.symbol, "X");
        assert!(report.sections[2].data.is_empty());

        let text = builder.build_text();
        let v = text.find("Volume flow").unwrap();
        let o = text.find("Order book").unwrap();
        assert!(v < o);
        assert!(text.contains("\n\nmanual\n\n"));
        assert!(text.ends_with(DISCLAIMER));
    }

    #[test]
    fn duplicate_sections_are_kept() {
        let flow = VolumeFlowAnalyzer::new("X", Vec::new());
        let report = ReportBuilder::new("X").add_all(&[&flow, &flow]).build_structured();
        assert_eq!(report.sections.len(), 2);
    }

    #[test]
    fn structured_report_is_stamped() {
        let report = ReportBuilder::new("X").build_structured();
        assert!(Uuid::parse_str(&report.report_id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&report.generated_at).is_ok());
    }
}
