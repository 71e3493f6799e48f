use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// Display names for the five Likert levels, indexed by `level - 1`.
pub const LEVEL_LABELS: [&str; 5] = ["Muito baixa", "Baixa", "Moderada", "Alta", "Muito Alta"];

/// One of the five risk dimensions covered by the questionnaire.
///
/// The variant order matches the numeric prefix of the survey codes
/// (`1.x` is Economic, `5.x` is Technological) and drives iteration order in
/// every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Economic,
    Environmental,
    Geopolitical,
    Social,
    Technological,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Economic,
        Dimension::Environmental,
        Dimension::Geopolitical,
        Dimension::Social,
        Dimension::Technological,
    ];

    /// Map the integer part of a variable code to its dimension.
    pub fn from_major(major: u32) -> Option<Self> {
        match major {
            1 => Some(Self::Economic),
            2 => Some(Self::Environmental),
            3 => Some(Self::Geopolitical),
            4 => Some(Self::Social),
            5 => Some(Self::Technological),
            _ => None,
        }
    }

    pub const fn major(self) -> u32 {
        match self {
            Self::Economic => 1,
            Self::Environmental => 2,
            Self::Geopolitical => 3,
            Self::Social => 4,
            Self::Technological => 5,
        }
    }

    /// Label used in report tables.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Economic => "Econômica",
            Self::Environmental => "Ambiental",
            Self::Geopolitical => "Geopolítica",
            Self::Social => "Social",
            Self::Technological => "Tecnológica",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time horizon a survey answer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "imediato_2025")]
    Immediate2025,
    #[serde(rename = "curto_prazo_2026_2027")]
    ShortTerm2026To2027,
    #[serde(rename = "longo_prazo_2035")]
    LongTerm2035,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 3] = [
        TimePeriod::Immediate2025,
        TimePeriod::ShortTerm2026To2027,
        TimePeriod::LongTerm2035,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Immediate2025 => "Imediato (2025)",
            Self::ShortTerm2026To2027 => "Curto prazo (2026-2027)",
            Self::LongTerm2035 => "Longo prazo (até 2035)",
        }
    }

    /// Stable machine key; also the serialized form.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Immediate2025 => "imediato_2025",
            Self::ShortTerm2026To2027 => "curto_prazo_2026_2027",
            Self::LongTerm2035 => "longo_prazo_2035",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric identifier of one survey question, e.g. `1.12`.
///
/// The same code names the question in all three time periods. Ordering is
/// numeric on `(major, minor)`, so `1.2` sorts before `1.12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VariableCode {
    major: u32,
    minor: u32,
    raw: String,
}

impl VariableCode {
    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Dimension implied by the integer part; `None` outside `1..=5`.
    pub fn dimension(&self) -> Option<Dimension> {
        Dimension::from_major(self.major)
    }
}

impl FromStr for VariableCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("variable code '{}' has no '.' separator", s))?;
        let all_digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(major) || !all_digits(minor) {
            return Err(format!("variable code '{}' is not of the form N.N", s));
        }
        let major = major
            .parse::<u32>()
            .map_err(|e| format!("variable code '{}': {}", s, e))?;
        let minor = minor
            .parse::<u32>()
            .map_err(|e| format!("variable code '{}': {}", s, e))?;
        Ok(Self {
            major,
            minor,
            raw: s.to_string(),
        })
    }
}

impl TryFrom<String> for VariableCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VariableCode> for String {
    fn from(code: VariableCode) -> Self {
        code.raw
    }
}

impl Ord for VariableCode {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, &self.raw).cmp(&(other.major, other.minor, &other.raw))
    }
}

impl PartialOrd for VariableCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VariableCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Overall risk classification derived from a variable's median and the
/// share of high answers. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    ModerateHigh,
    High,
    Critical,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Risco Baixo",
            Self::Moderate => "Risco Moderado",
            Self::ModerateHigh => "Risco Moderado-Alto",
            Self::High => "Risco Alto",
            Self::Critical => "Risco Crítico",
        }
    }

    /// Hex colour charting front-ends use for this level.
    pub const fn color_hex(self) -> &'static str {
        match self {
            Self::Low => "#228B22",
            Self::Moderate => "#90EE90",
            Self::ModerateHigh => "#FFD700",
            Self::High => "#FF8C00",
            Self::Critical => "#DC143C",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

/// Descriptive statistics for one Likert column.
///
/// Only ever built from at least one valid answer; an empty column has no
/// `FrequencyStats` at all. Frequency arrays are indexed by `level - 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyStats {
    pub total: usize,
    pub absolute: [usize; 5],
    pub relative: [f64; 5],
    pub median: f64,
    pub mode: u8,
    pub percentiles: Percentiles,
    pub iqr: f64,
    pub percent_risk_high: f64,
    pub percent_risk_low: f64,
    pub consensus_high: bool,
    pub dominant_category: u8,
}

impl FrequencyStats {
    /// Absolute count for a level in `1..=5`; zero for anything else.
    pub fn absolute_for(&self, level: u8) -> usize {
        match level {
            1..=5 => self.absolute[usize::from(level - 1)],
            _ => 0,
        }
    }

    pub fn relative_for(&self, level: u8) -> f64 {
        match level {
            1..=5 => self.relative[usize::from(level - 1)],
            _ => 0.0,
        }
    }
}

/// Direction of a variable's median across the time horizons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    ProgressiveIncrease,
    ProgressiveDecrease,
    LongTermIncrease,
    ShortTermPeak,
    Increase,
    Decrease,
    Stable,
}

impl Trend {
    pub const fn description(self) -> &'static str {
        match self {
            Self::ProgressiveIncrease => "Aumento progressivo da percepção de risco ao longo do tempo",
            Self::ProgressiveDecrease => "Redução progressiva da percepção de risco ao longo do tempo",
            Self::LongTermIncrease => "Aumento de risco esperado para longo prazo",
            Self::ShortTermPeak => "Pico de risco no curto prazo, retornando ao nível inicial",
            Self::Increase => "Aumento da percepção de risco",
            Self::Decrease => "Redução da percepção de risco",
            Self::Stable => "Percepção de risco estável",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct VariableStatsRow {
    #[serde(rename = "Dimension")]
    #[tabled(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Code")]
    #[tabled(rename = "Code")]
    pub code: String,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "N")]
    #[tabled(rename = "N")]
    pub total: usize,
    #[serde(rename = "Median")]
    #[tabled(rename = "Median")]
    pub median: String,
    #[serde(rename = "Mode")]
    #[tabled(rename = "Mode")]
    pub mode: u8,
    #[serde(rename = "IQR")]
    #[tabled(rename = "IQR")]
    pub iqr: String,
    #[serde(rename = "HighRiskPct")]
    #[tabled(rename = "HighRiskPct")]
    pub high_pct: String,
    #[serde(rename = "LowRiskPct")]
    #[tabled(rename = "LowRiskPct")]
    pub low_pct: String,
    #[serde(rename = "Consensus")]
    #[tabled(rename = "Consensus")]
    pub consensus: String,
    #[serde(rename = "RiskLevel")]
    #[tabled(rename = "RiskLevel")]
    pub risk_level: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DimensionSummaryRow {
    #[serde(rename = "Dimension")]
    #[tabled(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Variables")]
    #[tabled(rename = "Variables")]
    pub variables: usize,
    #[serde(rename = "MedianOfMedians")]
    #[tabled(rename = "MedianOfMedians")]
    pub median_of_medians: String,
    #[serde(rename = "MeanHighRiskPct")]
    #[tabled(rename = "MeanHighRiskPct")]
    pub mean_high_pct: String,
    #[serde(rename = "CriticalRisks")]
    #[tabled(rename = "CriticalRisks")]
    pub critical_risks: usize,
    #[serde(rename = "TopCritical")]
    #[tabled(rename = "TopCritical")]
    pub top_critical: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Dimension")]
    #[tabled(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "Code")]
    #[tabled(rename = "Code")]
    pub code: String,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Median2025")]
    #[tabled(rename = "Median2025")]
    pub median_immediate: String,
    #[serde(rename = "Median2026_2027")]
    #[tabled(rename = "Median2026_2027")]
    pub median_short_term: String,
    #[serde(rename = "Median2035")]
    #[tabled(rename = "Median2035")]
    pub median_long_term: String,
    #[serde(rename = "HighRiskPct2025")]
    #[tabled(rename = "HighRiskPct2025")]
    pub high_pct_immediate: String,
    #[serde(rename = "HighRiskPct2026_2027")]
    #[tabled(rename = "HighRiskPct2026_2027")]
    pub high_pct_short_term: String,
    #[serde(rename = "HighRiskPct2035")]
    #[tabled(rename = "HighRiskPct2035")]
    pub high_pct_long_term: String,
    #[serde(rename = "Trend")]
    #[tabled(rename = "Trend")]
    pub trend: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AppendixRow {
    #[serde(rename = "Code")]
    #[tabled(rename = "Code")]
    pub code: String,
    #[serde(rename = "Dimension")]
    #[tabled(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Description")]
    #[tabled(rename = "Description")]
    pub description: String,
    #[serde(rename = "Headers")]
    #[tabled(rename = "Headers")]
    pub headers: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct IndexCountRow {
    #[serde(rename = "Dimension")]
    #[tabled(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "Immediate (2025)")]
    #[tabled(rename = "Immediate (2025)")]
    pub immediate: usize,
    #[serde(rename = "Short term (2026-2027)")]
    #[tabled(rename = "Short term (2026-2027)")]
    pub short_term: usize,
    #[serde(rename = "Long term (2035)")]
    #[tabled(rename = "Long term (2035)")]
    pub long_term: usize,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AuditRow {
    #[serde(rename = "Kind")]
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[serde(rename = "Code")]
    #[tabled(rename = "Code")]
    pub code: String,
    #[serde(rename = "Header")]
    #[tabled(rename = "Header")]
    pub header: String,
    #[serde(rename = "Detail")]
    #[tabled(rename = "Detail")]
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub generated_at: String,
    pub total_respondents: usize,
    pub total_columns: usize,
    pub variables_per_dimension: Vec<DimensionCount>,
    pub total_critical_risks: usize,
    pub excluded_headers: usize,
    pub description_conflicts: usize,
}

#[derive(Debug, Serialize)]
pub struct DimensionCount {
    pub dimension: Dimension,
    pub variables: usize,
    pub columns: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_codes_sort_numerically() {
        let mut codes: Vec<VariableCode> = ["1.12", "1.2", "2.1", "1.1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        codes.sort();
        let sorted: Vec<&str> = codes.iter().map(VariableCode::as_str).collect();
        assert_eq!(sorted, vec!["1.1", "1.2", "1.12", "2.1"]);
    }

    #[test]
    fn variable_code_rejects_malformed_text() {
        assert!("1".parse::<VariableCode>().is_err());
        assert!("1.".parse::<VariableCode>().is_err());
        assert!("a.2".parse::<VariableCode>().is_err());
        assert!("1.2.3".parse::<VariableCode>().is_err());
    }

    #[test]
    fn variable_code_dimension_follows_major() {
        let code: VariableCode = "4.1".parse().unwrap();
        assert_eq!(code.dimension(), Some(Dimension::Social));
        let code: VariableCode = "9.1".parse().unwrap();
        assert_eq!(code.dimension(), None);
    }

    #[test]
    fn variable_code_serializes_as_string() {
        let code: VariableCode = "3.7".parse().unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"3.7\"");
        let back: VariableCode = serde_json::from_str("\"3.7\"").unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn risk_levels_are_ordered_by_severity() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::ModerateHigh);
        assert!(RiskLevel::ModerateHigh > RiskLevel::Moderate);
        assert!(RiskLevel::Moderate > RiskLevel::Low);
    }
}
