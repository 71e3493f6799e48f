//! Ordinal statistics for Likert (1-5) answer columns.

use crate::config::RiskThresholds;
use crate::types::{FrequencyStats, Percentiles, RiskLevel, TimePeriod, Trend};
use crate::util::percentile_sorted;
use std::collections::BTreeMap;

/// Share above which a single level counts as consensus.
pub const DEFAULT_CONSENSUS_THRESHOLD: f64 = 0.70;

/// Level in `1..=5` for a valid answer; anything else is treated as missing.
fn likert_level(value: f64) -> Option<u8> {
    if value.is_finite() && value.fract() == 0.0 && (1.0..=5.0).contains(&value) {
        Some(value as u8)
    } else {
        None
    }
}

/// Statistics with the default consensus threshold.
pub fn compute_frequency_stats(responses: &[Option<f64>]) -> Option<FrequencyStats> {
    compute_frequency_stats_with(responses, DEFAULT_CONSENSUS_THRESHOLD)
}

/// Descriptive statistics for one answer column.
///
/// Missing answers and values that are not whole numbers in `1..=5` are
/// dropped before anything is counted. Returns `None` when no valid answer
/// remains. Mode and dominant category break ties towards the lower level.
pub fn compute_frequency_stats_with(
    responses: &[Option<f64>],
    consensus_threshold: f64,
) -> Option<FrequencyStats> {
    let levels: Vec<u8> = responses
        .iter()
        .filter_map(|v| v.and_then(likert_level))
        .collect();
    if levels.is_empty() {
        return None;
    }

    let total = levels.len();
    let mut absolute = [0usize; 5];
    for level in &levels {
        absolute[usize::from(*level - 1)] += 1;
    }
    let relative = absolute.map(|count| count as f64 / total as f64);

    let mut sorted: Vec<f64> = levels.iter().map(|l| f64::from(*l)).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let percentiles = Percentiles {
        p25: percentile_sorted(&sorted, 0.25),
        p50: percentile_sorted(&sorted, 0.50),
        p75: percentile_sorted(&sorted, 0.75),
    };

    // Strict `>` keeps the first (lowest) level on ties.
    let mut mode_idx = 0;
    for (idx, count) in absolute.iter().enumerate() {
        if *count > absolute[mode_idx] {
            mode_idx = idx;
        }
    }
    let mode = (mode_idx + 1) as u8;

    let high = absolute[3] + absolute[4];
    let low = absolute[0] + absolute[1];
    let max_relative = relative.iter().copied().fold(0.0_f64, f64::max);

    Some(FrequencyStats {
        total,
        absolute,
        relative,
        median: percentiles.p50,
        mode,
        percentiles,
        iqr: percentiles.p75 - percentiles.p25,
        percent_risk_high: high as f64 / total as f64 * 100.0,
        percent_risk_low: low as f64 / total as f64 * 100.0,
        consensus_high: max_relative > consensus_threshold,
        dominant_category: mode,
    })
}

/// Risk level with the default thresholds.
pub fn classify_risk_level(median: f64, percent_risk_high: f64) -> RiskLevel {
    classify_risk_level_with(&RiskThresholds::default(), median, percent_risk_high)
}

/// Decision table, evaluated top to bottom; the first matching rule wins.
///
/// The rules overlap, so a high median with a modest share of high answers
/// (e.g. 4.2 and 35%) fails the first three rules and lands on `Moderate`.
pub fn classify_risk_level_with(
    thresholds: &RiskThresholds,
    median: f64,
    percent_risk_high: f64,
) -> RiskLevel {
    if median >= thresholds.critical_median && percent_risk_high > thresholds.critical_high_pct {
        RiskLevel::Critical
    } else if median >= thresholds.high_median && percent_risk_high > thresholds.high_high_pct {
        RiskLevel::High
    } else if median >= thresholds.moderate_high_median
        && percent_risk_high > thresholds.moderate_high_high_pct
    {
        RiskLevel::ModerateHigh
    } else if median >= thresholds.moderate_median {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

impl FrequencyStats {
    pub fn risk_level(&self, thresholds: &RiskThresholds) -> RiskLevel {
        classify_risk_level_with(thresholds, self.median, self.percent_risk_high)
    }
}

/// How the median moves across the periods that have data.
///
/// Needs at least two periods. With all three, only strictly monotone runs
/// count as progressive; the two named plateau shapes are recognised and
/// everything else is `Stable`.
pub fn identify_trend(medians: &BTreeMap<TimePeriod, f64>) -> Option<Trend> {
    let m: Vec<f64> = TimePeriod::ALL
        .iter()
        .filter_map(|p| medians.get(p).copied())
        .collect();

    match m.as_slice() {
        [first, second, third] => Some(if third > second && second > first {
            Trend::ProgressiveIncrease
        } else if third < second && second < first {
            Trend::ProgressiveDecrease
        } else if third > first && second == first {
            Trend::LongTermIncrease
        } else if third == first && second > first {
            Trend::ShortTermPeak
        } else {
            Trend::Stable
        }),
        [first, second] => Some(if second > first {
            Trend::Increase
        } else if second < first {
            Trend::Decrease
        } else {
            Trend::Stable
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mixed_column_statistics() {
        let stats =
            compute_frequency_stats(&column(&[1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 5.0, 5.0, 5.0])).unwrap();
        assert_eq!(stats.total, 9);
        assert_eq!(stats.absolute, [2, 1, 1, 1, 4]);
        assert_eq!(stats.median, 4.0);
        assert_eq!(stats.mode, 5);
        assert!(close(stats.percent_risk_high, 5.0 / 9.0 * 100.0));
        assert!(close(stats.percent_risk_low, 3.0 / 9.0 * 100.0));
        assert!(!stats.consensus_high);
        assert_eq!(stats.percentiles.p25, 2.0);
        assert_eq!(stats.percentiles.p75, 5.0);
        assert_eq!(stats.iqr, 3.0);
    }

    #[test]
    fn consensus_when_one_level_dominates() {
        let stats =
            compute_frequency_stats(&column(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 2.0])).unwrap();
        assert!(stats.consensus_high);
        assert_eq!(stats.dominant_category, 5);
        assert!(close(stats.relative_for(5), 0.875));
    }

    #[test]
    fn consensus_needs_strictly_more_than_threshold() {
        // 7 of 10 is exactly 0.70.
        let mut values = vec![3.0; 7];
        values.extend([1.0, 2.0, 4.0]);
        let stats = compute_frequency_stats(&column(&values)).unwrap();
        assert!(!stats.consensus_high);
    }

    #[test]
    fn all_missing_column_is_empty() {
        assert!(compute_frequency_stats(&[None, None]).is_none());
        assert!(compute_frequency_stats(&[]).is_none());
    }

    #[test]
    fn out_of_scale_values_are_missing() {
        let stats =
            compute_frequency_stats(&[Some(0.0), Some(6.0), Some(2.5), Some(f64::NAN), Some(3.0), None])
                .unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.absolute_for(3), 1);
        assert_eq!(stats.absolute_for(9), 0);
    }

    #[test]
    fn mode_ties_pick_lowest_level() {
        let stats = compute_frequency_stats(&column(&[4.0, 2.0, 4.0, 2.0, 5.0])).unwrap();
        assert_eq!(stats.mode, 2);
        assert_eq!(stats.dominant_category, 2);
    }

    #[test]
    fn unused_levels_are_explicit_zeros() {
        let stats = compute_frequency_stats(&column(&[3.0, 3.0])).unwrap();
        assert_eq!(stats.absolute, [0, 0, 2, 0, 0]);
        assert_eq!(stats.relative[0], 0.0);
        assert_eq!(stats.relative[2], 1.0);
    }

    #[test]
    fn custom_consensus_threshold() {
        let stats =
            compute_frequency_stats_with(&column(&[4.0, 4.0, 4.0, 1.0]), 0.5).unwrap();
        assert!(stats.consensus_high);
    }

    #[test]
    fn risk_table_preserves_fallthrough() {
        assert_eq!(classify_risk_level(4.2, 35.0), RiskLevel::Moderate);
        assert_eq!(classify_risk_level(4.5, 60.0), RiskLevel::Critical);
        assert_eq!(classify_risk_level(1.5, 10.0), RiskLevel::Low);
    }

    #[test]
    fn risk_table_boundaries() {
        assert_eq!(classify_risk_level(4.0, 50.0), RiskLevel::High);
        assert_eq!(classify_risk_level(3.5, 41.0), RiskLevel::High);
        assert_eq!(classify_risk_level(3.0, 30.5), RiskLevel::ModerateHigh);
        assert_eq!(classify_risk_level(3.0, 30.0), RiskLevel::Moderate);
        assert_eq!(classify_risk_level(2.0, 0.0), RiskLevel::Moderate);
        assert_eq!(classify_risk_level(1.99, 90.0), RiskLevel::Low);
    }

    #[test]
    fn stats_risk_level_uses_thresholds() {
        let stats = compute_frequency_stats(&column(&[5.0, 5.0, 4.0, 1.0])).unwrap();
        assert_eq!(stats.risk_level(&RiskThresholds::default()), RiskLevel::Critical);
        let strict = RiskThresholds {
            critical_median: 5.0,
            ..RiskThresholds::default()
        };
        assert_eq!(stats.risk_level(&strict), RiskLevel::High);
    }

    fn medians(values: &[(TimePeriod, f64)]) -> BTreeMap<TimePeriod, f64> {
        values.iter().copied().collect()
    }

    #[test]
    fn trend_over_three_periods() {
        let t = |a, b, c| {
            identify_trend(&medians(&[
                (TimePeriod::Immediate2025, a),
                (TimePeriod::ShortTerm2026To2027, b),
                (TimePeriod::LongTerm2035, c),
            ]))
        };
        assert_eq!(t(2.0, 3.0, 4.0), Some(Trend::ProgressiveIncrease));
        assert_eq!(t(4.0, 3.0, 2.0), Some(Trend::ProgressiveDecrease));
        assert_eq!(t(3.0, 3.0, 4.0), Some(Trend::LongTermIncrease));
        assert_eq!(t(3.0, 4.0, 3.0), Some(Trend::ShortTermPeak));
        assert_eq!(t(3.0, 2.0, 3.0), Some(Trend::Stable));
    }

    #[test]
    fn trend_over_two_periods_and_less() {
        assert_eq!(
            identify_trend(&medians(&[
                (TimePeriod::Immediate2025, 3.0),
                (TimePeriod::LongTerm2035, 4.0),
            ])),
            Some(Trend::Increase)
        );
        assert_eq!(
            identify_trend(&medians(&[
                (TimePeriod::ShortTerm2026To2027, 3.0),
                (TimePeriod::LongTerm2035, 3.0),
            ])),
            Some(Trend::Stable)
        );
        assert_eq!(
            identify_trend(&medians(&[(TimePeriod::Immediate2025, 3.0)])),
            None
        );
    }
}
