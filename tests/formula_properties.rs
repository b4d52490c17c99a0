//! Property tests for the formula tokenizer and the scoring model.

use proptest::prelude::*;
use sheetaudit::config::{AnalysisThresholds, ScoringRules};
use sheetaudit::core::{column_index, column_letters, FindingSet};
use sheetaudit::formula::{nesting_depth, normalize_pattern};
use sheetaudit::risk::assess;

proptest! {
    #[test]
    fn pattern_normalization_is_idempotent(formula in "[A-Za-z0-9$+*/(),.!\"= ]{0,60}") {
        let once = normalize_pattern(&formula);
        let twice = normalize_pattern(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn nesting_depth_never_exceeds_open_paren_count(formula in "[A-Z0-9(),+]{0,40}") {
        let opens = formula.chars().filter(|c| *c == '(').count() as u32;
        prop_assert!(nesting_depth(&formula) <= opens);
    }

    #[test]
    fn column_letters_round_trip(index in 1u32..20_000) {
        let letters = column_letters(index);
        prop_assert_eq!(column_index(&letters), index);
    }

    #[test]
    fn risk_score_is_clamped(circular in 0usize..500, errors in 0usize..500) {
        let mut findings = FindingSet::default();
        for i in 0..circular {
            findings.circular_references.push(format!("Sheet1!A{i}"));
        }
        for i in 0..errors {
            findings.errors_found.push(sheetaudit::core::ErrorCell {
                cell: format!("Sheet1!B{i}"),
                error: "#REF!".to_string(),
                severity: sheetaudit::core::Severity::Critical,
            });
        }
        let assessment = assess(
            &findings,
            &ScoringRules::default(),
            &AnalysisThresholds::default(),
        );
        prop_assert!(assessment.score <= 100);
    }
}
