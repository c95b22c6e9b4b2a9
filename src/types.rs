// =============================================================================
// Shared types used across the analyst service
// =============================================================================

use serde::{Deserialize, Serialize};

/// Which report a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Candles,
    Orderbook,
    Volume,
    Derivatives,
    Correlation,
    Full,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        Self::Candles,
        Self::Orderbook,
        Self::Volume,
        Self::Derivatives,
        Self::Correlation,
        Self::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candles => "candles",
            Self::Orderbook => "orderbook",
            Self::Volume => "volume",
            Self::Derivatives => "derivatives",
            Self::Correlation => "correlation",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown report kind '{s}'"))
    }
}
