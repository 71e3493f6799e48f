use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::loader::SurveyTable;
use crate::schema::{
    extract_variable_code, short_label, CatalogEntry, ExclusionReason, SchemaIndex,
    VariableCatalog,
};
use crate::stats::{compute_frequency_stats_with, identify_trend};
use crate::types::{
    AppendixRow, AuditRow, Dimension, DimensionCount, DimensionSummaryRow, FrequencyStats,
    IndexCountRow, RiskLevel, SummaryStats, TimePeriod, TrendRow, VariableStatsRow,
};
use crate::util::{average, format_number, format_optional, median};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Statistics for one indexed column.
#[derive(Debug, Clone)]
pub struct VariableAnalysis {
    pub dimension: Dimension,
    pub period: TimePeriod,
    /// Input column position; identical headers differ only here.
    pub position: usize,
    pub header: String,
    pub stats: FrequencyStats,
    pub risk_level: RiskLevel,
}

/// Compute statistics for every indexed column, in index order.
///
/// Columns without a single valid answer are skipped with a warning.
pub fn analyze_variables(
    table: &SurveyTable,
    index: &SchemaIndex,
    config: &AnalysisConfig,
) -> Result<Vec<VariableAnalysis>> {
    let mut results = Vec::new();
    for (dimension, period, position, header) in index.columns() {
        let responses = table.responses_at(position)?;
        let Some(stats) = compute_frequency_stats_with(&responses, config.consensus_threshold)
        else {
            warn!(%dimension, %period, position, header, "no valid answers");
            continue;
        };
        let risk_level = stats.risk_level(&config.thresholds);
        debug!(
            position,
            header,
            total = stats.total,
            median = stats.median,
            %risk_level,
            "analyzed variable"
        );
        results.push(VariableAnalysis {
            dimension,
            period,
            position,
            header: header.to_string(),
            stats,
            risk_level,
        });
    }
    info!(variables = results.len(), "variable statistics computed");
    Ok(results)
}

/// Statistics of one variable in each period it was asked for.
pub fn variable_profile(
    table: &SurveyTable,
    entry: &CatalogEntry,
    config: &AnalysisConfig,
) -> Result<Vec<(TimePeriod, String, Option<FrequencyStats>)>> {
    let mut profile = Vec::new();
    for period in entry.periods() {
        let Some(header) = entry.header_for(period) else {
            continue;
        };
        let responses = table.responses(header)?;
        let stats = compute_frequency_stats_with(&responses, config.consensus_threshold);
        profile.push((period, header.to_string(), stats));
    }
    Ok(profile)
}

pub fn generate_variable_report(results: &[VariableAnalysis]) -> Vec<VariableStatsRow> {
    results
        .iter()
        .map(|r| VariableStatsRow {
            dimension: r.dimension.label().to_string(),
            period: r.period.label().to_string(),
            code: extract_variable_code(&r.header)
                .map(|c| c.to_string())
                .unwrap_or_default(),
            label: short_label(&r.header),
            total: r.stats.total,
            median: format_number(r.stats.median, 1),
            mode: r.stats.mode,
            iqr: format_number(r.stats.iqr, 2),
            high_pct: format_number(r.stats.percent_risk_high, 1),
            low_pct: format_number(r.stats.percent_risk_low, 1),
            consensus: if r.stats.consensus_high { "yes" } else { "no" }.to_string(),
            risk_level: r.risk_level.label().to_string(),
        })
        .collect()
}

pub fn generate_dimension_summary(
    results: &[VariableAnalysis],
    config: &AnalysisConfig,
) -> Vec<DimensionSummaryRow> {
    let mut cells: BTreeMap<(Dimension, TimePeriod), Vec<&VariableAnalysis>> = BTreeMap::new();
    for r in results {
        cells.entry((r.dimension, r.period)).or_default().push(r);
    }

    cells
        .into_iter()
        .map(|((dimension, period), vars)| {
            let medians: Vec<f64> = vars.iter().map(|v| v.stats.median).collect();
            let high: Vec<f64> = vars.iter().map(|v| v.stats.percent_risk_high).collect();
            let mut critical: Vec<&VariableAnalysis> = vars
                .iter()
                .copied()
                .filter(|v| v.risk_level == RiskLevel::Critical)
                .collect();
            critical.sort_by(|a, b| {
                b.stats
                    .percent_risk_high
                    .partial_cmp(&a.stats.percent_risk_high)
                    .unwrap_or(Ordering::Equal)
            });
            let top_critical = critical
                .iter()
                .take(config.top_critical)
                .map(|v| {
                    let code = extract_variable_code(&v.header)
                        .map(|c| format!("{} ", c))
                        .unwrap_or_default();
                    format!(
                        "{}{} ({}%)",
                        code,
                        short_label(&v.header),
                        format_number(v.stats.percent_risk_high, 1)
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            DimensionSummaryRow {
                dimension: dimension.label().to_string(),
                period: period.label().to_string(),
                variables: vars.len(),
                median_of_medians: format_number(median(medians), 2),
                mean_high_pct: format_number(average(&high), 1),
                critical_risks: critical.len(),
                top_critical,
            }
        })
        .collect()
}

/// Per-variable evolution across the three horizons.
pub fn generate_trend_report(
    table: &SurveyTable,
    catalog: &VariableCatalog,
    config: &AnalysisConfig,
) -> Result<Vec<TrendRow>> {
    let mut rows = Vec::new();
    for entry in catalog.entries() {
        let mut medians: BTreeMap<TimePeriod, f64> = BTreeMap::new();
        let mut high: BTreeMap<TimePeriod, f64> = BTreeMap::new();
        for (period, _, stats) in variable_profile(table, entry, config)? {
            if let Some(stats) = stats {
                medians.insert(period, stats.median);
                high.insert(period, stats.percent_risk_high);
            }
        }
        let at = |map: &BTreeMap<TimePeriod, f64>, period: TimePeriod| map.get(&period).copied();
        rows.push(TrendRow {
            dimension: entry.dimension.label().to_string(),
            code: entry.code.to_string(),
            label: entry.label(),
            median_immediate: format_optional(at(&medians, TimePeriod::Immediate2025), 1),
            median_short_term: format_optional(at(&medians, TimePeriod::ShortTerm2026To2027), 1),
            median_long_term: format_optional(at(&medians, TimePeriod::LongTerm2035), 1),
            high_pct_immediate: format_optional(at(&high, TimePeriod::Immediate2025), 1),
            high_pct_short_term: format_optional(at(&high, TimePeriod::ShortTerm2026To2027), 1),
            high_pct_long_term: format_optional(at(&high, TimePeriod::LongTerm2035), 1),
            trend: identify_trend(&medians)
                .map(|t| t.description().to_string())
                .unwrap_or_else(|| "-".to_string()),
        });
    }
    Ok(rows)
}

/// Column counts per dimension and period.
pub fn generate_index_counts(index: &SchemaIndex) -> Vec<IndexCountRow> {
    Dimension::ALL
        .iter()
        .map(|d| IndexCountRow {
            dimension: d.label().to_string(),
            immediate: index.headers(*d, TimePeriod::Immediate2025).len(),
            short_term: index.headers(*d, TimePeriod::ShortTerm2026To2027).len(),
            long_term: index.headers(*d, TimePeriod::LongTerm2035).len(),
            total: index.dimension_total(*d),
        })
        .collect()
}

pub fn generate_appendix(catalog: &VariableCatalog) -> Vec<AppendixRow> {
    catalog
        .entries()
        .map(|entry| AppendixRow {
            code: entry.code.to_string(),
            dimension: entry.dimension.label().to_string(),
            label: entry.label(),
            description: entry.description.clone(),
            headers: entry
                .headers
                .values()
                .flatten()
                .cloned()
                .collect::<Vec<_>>()
                .join(" | "),
        })
        .collect()
}

/// Everything a reviewer should look at before trusting the index.
pub fn generate_audit(index: &SchemaIndex, catalog: &VariableCatalog) -> Vec<AuditRow> {
    let mut rows: Vec<AuditRow> = index
        .excluded()
        .iter()
        .map(|e| AuditRow {
            kind: match e.reason {
                ExclusionReason::NoDimensionPrefix => "metadata",
                ExclusionReason::NoPeriodPhrase => "excluded",
            }
            .to_string(),
            code: extract_variable_code(&e.header)
                .map(|c| c.to_string())
                .unwrap_or_default(),
            header: e.header.clone(),
            detail: format!("column {}: {}", e.position + 1, e.reason.description()),
        })
        .collect();

    rows.extend(catalog.uncoded().iter().map(|header| AuditRow {
        kind: "uncoded".to_string(),
        code: String::new(),
        header: header.clone(),
        detail: "no leading N.N code".to_string(),
    }));

    for entry in catalog.conflicts() {
        rows.push(AuditRow {
            kind: "description_conflict".to_string(),
            code: entry.code.to_string(),
            header: entry.description.clone(),
            detail: entry
                .descriptions
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(" | "),
        });
    }

    for (entry, period) in catalog.duplicates() {
        let headers = entry.headers.get(&period).cloned().unwrap_or_default();
        rows.push(AuditRow {
            kind: "duplicate".to_string(),
            code: entry.code.to_string(),
            header: headers.first().cloned().unwrap_or_default(),
            detail: format!("{} columns for {}", headers.len(), period.label()),
        });
    }
    rows
}

pub fn generate_summary(
    table: &SurveyTable,
    index: &SchemaIndex,
    catalog: &VariableCatalog,
    results: &[VariableAnalysis],
) -> SummaryStats {
    let variables_per_dimension = Dimension::ALL
        .iter()
        .map(|d| DimensionCount {
            dimension: *d,
            variables: catalog.dimension_entries(*d).count(),
            columns: index.dimension_total(*d),
        })
        .collect();
    SummaryStats {
        generated_at: chrono::Local::now().format("%d/%m/%Y %H:%M:%S").to_string(),
        total_respondents: table.row_count(),
        total_columns: table.headers().len(),
        variables_per_dimension,
        total_critical_risks: results
            .iter()
            .filter(|r| r.risk_level == RiskLevel::Critical)
            .count(),
        excluded_headers: index.unassigned().count(),
        description_conflicts: catalog.conflicts().count(),
    }
}
