//! Analysis configuration.
//!
//! Everything the mapper and the statistics engine treat as fixed schema
//! (dimension prefixes, period phrases, risk thresholds) lives here and is
//! passed explicitly. `AnalysisConfig::default()` reproduces the port-risk
//! questionnaire; a JSON file can override any part of it.

use crate::error::{ReportError, Result};
use crate::schema;
use crate::types::{Dimension, TimePeriod};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Header prefix that identifies a dimension's columns, e.g. `"1."`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionPrefix {
    pub prefix: String,
    pub dimension: Dimension,
}

/// Literal substrings that mark a header as belonging to a period.
///
/// Includes truncated variants because the spreadsheet export cuts long
/// headers at a fixed width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPhrases {
    pub period: TimePeriod,
    pub phrases: Vec<String>,
}

/// Cut-offs for the risk decision table. Each rule requires
/// `median >= *_median` and `percent_risk_high > *_high_pct`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub critical_median: f64,
    pub critical_high_pct: f64,
    pub high_median: f64,
    pub high_high_pct: f64,
    pub moderate_high_median: f64,
    pub moderate_high_high_pct: f64,
    /// Median floor for `Moderate`; no percentage condition.
    pub moderate_median: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical_median: 4.0,
            critical_high_pct: 50.0,
            high_median: 3.5,
            high_high_pct: 40.0,
            moderate_high_median: 3.0,
            moderate_high_high_pct: 30.0,
            moderate_median: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub dimension_prefixes: Vec<DimensionPrefix>,
    /// Tested in this order; the first period whose phrases match wins.
    pub period_phrases: Vec<PeriodPhrases>,
    pub thresholds: RiskThresholds,
    /// A variable has consensus when one level's share exceeds this.
    pub consensus_threshold: f64,
    /// Number of critical risks listed per dimension summary row.
    pub top_critical: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let prefix = |prefix: &str, dimension| DimensionPrefix {
            prefix: prefix.to_string(),
            dimension,
        };
        let phrases = |period, list: &[&str]| PeriodPhrases {
            period,
            phrases: list.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            dimension_prefixes: vec![
                prefix("1.", Dimension::Economic),
                prefix("2.", Dimension::Environmental),
                prefix("3.", Dimension::Geopolitical),
                prefix("4.", Dimension::Social),
                prefix("5.", Dimension::Technological),
            ],
            period_phrases: vec![
                phrases(TimePeriod::Immediate2025, &["Imediato (2025)", "2025"]),
                phrases(
                    TimePeriod::ShortTerm2026To2027,
                    &["Curto prazo (2026 a 2027)", "Curto prazo (2026 a", "2026-2027"],
                ),
                phrases(
                    TimePeriod::LongTerm2035,
                    &[
                        "Longo prazo (até 2035)",
                        "Longo prazo (até 203",
                        "Longo prazo (ate 203",
                        "2035",
                    ],
                ),
            ],
            thresholds: RiskThresholds::default(),
            consensus_threshold: 0.70,
            top_critical: 10,
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON configuration file; omitted fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ReportError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AnalysisConfig =
            serde_json::from_str(&text).map_err(|source| ReportError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(ReportError::InvalidConfig { reason });

        if self.dimension_prefixes.is_empty() {
            return invalid("no dimension prefixes configured".to_string());
        }
        if let Some(p) = self
            .dimension_prefixes
            .iter()
            .find(|p| p.prefix.trim().is_empty())
        {
            return invalid(format!("empty prefix for dimension {}", p.dimension));
        }
        if self.period_phrases.is_empty() {
            return invalid("no period phrase sets configured".to_string());
        }
        let mut seen = HashSet::new();
        for set in &self.period_phrases {
            if !seen.insert(set.period) {
                return invalid(format!("period {} configured more than once", set.period));
            }
            if set.phrases.iter().all(|p| p.is_empty()) {
                return invalid(format!("period {} has no phrases", set.period));
            }
        }
        if !(self.consensus_threshold > 0.0 && self.consensus_threshold < 1.0) {
            return invalid(format!(
                "consensus threshold {} must lie strictly between 0 and 1",
                self.consensus_threshold
            ));
        }
        Ok(())
    }

    /// Dimension whose prefix the header starts with, if any.
    pub fn dimension_for(&self, header: &str) -> Option<Dimension> {
        schema::match_dimension(header, &self.dimension_prefixes)
    }
}
