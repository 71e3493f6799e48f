//! Integration tests for the frequency statistics and risk classification.

use likert_risk_report::types::RiskLevel;
use likert_risk_report::{classify_risk_level, compute_frequency_stats};
use proptest::prelude::*;

#[test]
fn test_spreadsheet_cells_to_stats() {
    let cells = ["5", "4,0", "-", "", "n/a", "5", "1", "3"];
    let responses: Vec<Option<f64>> = cells
        .iter()
        .map(|c| likert_risk_report::util::parse_likert_safe(Some(c)))
        .collect();
    let stats = compute_frequency_stats(&responses).unwrap();

    assert_eq!(stats.total, 5);
    assert_eq!(stats.absolute, [1, 0, 1, 1, 2]);
    assert_eq!(stats.median, 4.0);
    assert_eq!(stats.mode, 5);
    assert!((stats.percent_risk_high - 60.0).abs() < 1e-9);
    assert_eq!(
        classify_risk_level(stats.median, stats.percent_risk_high),
        RiskLevel::Critical
    );
}

#[test]
fn test_risk_levels_are_ordered() {
    assert!(RiskLevel::Low < RiskLevel::Moderate);
    assert!(RiskLevel::High < RiskLevel::Critical);
}

fn responses() -> impl Strategy<Value = Vec<Option<f64>>> {
    let cell = prop_oneof![
        4 => (1u8..=5).prop_map(|v| Some(f64::from(v))),
        1 => Just(None),
        1 => (-3.0f64..9.0).prop_map(Some),
    ];
    prop::collection::vec(cell, 0..60)
}

proptest! {
    #[test]
    fn frequencies_account_for_every_valid_answer(values in responses()) {
        let valid = values
            .iter()
            .flatten()
            .filter(|v| v.fract() == 0.0 && (1.0..=5.0).contains(*v))
            .count();
        match compute_frequency_stats(&values) {
            None => prop_assert_eq!(valid, 0),
            Some(stats) => {
                prop_assert_eq!(stats.total, valid);
                prop_assert_eq!(stats.absolute.iter().sum::<usize>(), valid);
                let relative: f64 = stats.relative.iter().sum();
                prop_assert!((relative - 1.0).abs() < 1e-9);
                prop_assert!(stats.percentiles.p25 <= stats.percentiles.p50);
                prop_assert!(stats.percentiles.p50 <= stats.percentiles.p75);
                prop_assert!((1.0..=5.0).contains(&stats.median));
                prop_assert!(stats.iqr >= 0.0);
                prop_assert!(stats.percent_risk_high + stats.percent_risk_low <= 100.0 + 1e-9);
                prop_assert_eq!(stats.mode, stats.dominant_category);
                let mode_count = stats.absolute_for(stats.mode);
                prop_assert!(stats.absolute.iter().all(|c| *c <= mode_count));
            }
        }
    }

    #[test]
    fn risk_level_never_drops_as_median_rises(median in 1.0f64..=5.0, pct in 0.0f64..=100.0) {
        let bumped = (median + 0.5).min(5.0);
        prop_assert!(classify_risk_level(bumped, pct) >= classify_risk_level(median, pct));
    }
}
