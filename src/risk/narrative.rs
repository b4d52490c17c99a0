//! Executive-summary rendering.
//!
//! A deterministic template renderer: the same findings and assessment
//! always produce the same text. No randomness, no timestamps.

use crate::core::{FindingSet, RiskAssessment, RiskLevel, SheetVisibility};

const MAX_FACTORS: usize = 5;
const MAX_SAMPLES: usize = 3;
const MAX_HIDDEN_LINES: usize = 3;

/// The message rendered for a workbook with nothing to report.
pub const NO_RED_FLAGS: &str = "No red flags were found in this workbook: formulas are \
consistent, nothing is hidden, and no error values are present.";

pub fn render(findings: &FindingSet, assessment: &RiskAssessment) -> String {
    if assessment.score == 0 && findings_are_empty(findings) {
        return NO_RED_FLAGS.to_string();
    }

    let mut out = String::new();
    out.push_str(opening(assessment.risk_level));
    if !findings.hidden_content.is_empty() {
        out.push(' ');
        out.push_str(&hidden_opening(findings));
    }
    out.push_str("\n\n");

    if !assessment.risk_factors.is_empty() {
        out.push_str("Top risk factors:\n");
        for factor in assessment.risk_factors.iter().take(MAX_FACTORS) {
            out.push_str(&format!(
                "- {} (+{} points): {}\n",
                factor.name, factor.points, factor.detail
            ));
        }
        out.push('\n');
    }

    if !findings.circular_references.is_empty() {
        let shown: Vec<&str> = findings
            .circular_references
            .iter()
            .take(MAX_SAMPLES)
            .map(String::as_str)
            .collect();
        let more = findings.circular_references.len().saturating_sub(MAX_SAMPLES);
        out.push_str(&format!("Circular references: {}", shown.join(", ")));
        if more > 0 {
            out.push_str(&format!(" (and {more} more)"));
        }
        out.push_str("\n\n");
    }

    if !findings.formula_inconsistencies.is_empty() {
        out.push_str("Formula inconsistencies:\n");
        for finding in findings.formula_inconsistencies.iter().take(MAX_SAMPLES) {
            out.push_str(&format!("- {}\n", finding.detail));
        }
        out.push('\n');
    }

    if !findings.hardcoded_overrides.is_empty() {
        out.push_str("Hardcoded overrides:\n");
        for finding in findings.hardcoded_overrides.iter().take(MAX_SAMPLES) {
            out.push_str(&format!("- {}\n", finding.detail));
        }
        out.push('\n');
    }

    let hidden_lines = hidden_detail_lines(findings);
    if !hidden_lines.is_empty() {
        out.push_str("Hidden content:\n");
        for line in hidden_lines.iter().take(MAX_HIDDEN_LINES) {
            out.push_str(&format!("- {line}\n"));
        }
        out.push('\n');
    }

    out.push_str(closing(assessment.risk_level));
    out.push('\n');
    out
}

fn findings_are_empty(findings: &FindingSet) -> bool {
    findings.circular_references.is_empty()
        && findings.formula_inconsistencies.is_empty()
        && findings.hardcoded_overrides.is_empty()
        && findings.hidden_content.is_empty()
        && findings.errors_found.is_empty()
        && !findings.has_vba
}

fn opening(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => {
            "This workbook shows multiple serious red flags consistent with deliberate \
             manipulation or significant structural failure."
        }
        RiskLevel::High => {
            "This workbook shows several patterns that warrant close scrutiny before its \
             numbers are relied upon."
        }
        RiskLevel::Medium => {
            "This workbook is broadly consistent but contains a few findings an auditor \
             should walk through."
        }
        RiskLevel::Low => "This workbook shows a small number of findings worth noting.",
    }
}

fn hidden_opening(findings: &FindingSet) -> String {
    let hidden = &findings.hidden_content;
    let mut parts = Vec::new();
    let very_hidden = hidden.very_hidden_count();
    if very_hidden > 0 {
        parts.push(format!("{very_hidden} very hidden sheet(s)"));
    }
    let hidden_sheets = hidden.hidden_sheet_count();
    if hidden_sheets > 0 {
        parts.push(format!("{hidden_sheets} hidden sheet(s)"));
    }
    let hidden_rows = hidden.hidden_row_count();
    if hidden_rows > 0 {
        parts.push(format!("{hidden_rows} hidden row(s)"));
    }
    if !hidden.hidden_cols.is_empty() {
        let cols: usize = hidden.hidden_cols.iter().map(|r| r.count).sum();
        parts.push(format!("{cols} hidden column(s)"));
    }
    format!(
        "It also contains hidden content ({}) that is not visible in a normal review.",
        parts.join(", ")
    )
}

fn hidden_detail_lines(findings: &FindingSet) -> Vec<String> {
    let hidden = &findings.hidden_content;
    let mut lines = Vec::new();
    for sheet in &hidden.hidden_sheets {
        let state = match sheet.visibility {
            SheetVisibility::VeryHidden => "very hidden (not reachable via the UI)",
            SheetVisibility::Hidden => "hidden",
            SheetVisibility::Visible => continue,
        };
        lines.push(format!(
            "sheet '{}' is {state}, {} rows x {} columns",
            sheet.name, sheet.row_count, sheet.col_count
        ));
    }
    for run in &hidden.hidden_rows {
        lines.push(format!("{} hidden rows on '{}'", run.count, run.sheet));
    }
    for run in &hidden.hidden_cols {
        lines.push(format!("{} hidden columns on '{}'", run.count, run.sheet));
    }
    lines
}

fn closing(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => {
            "Recommendation: do not rely on this workbook until every flagged cell has been \
             reviewed against source data and the hidden content has been examined."
        }
        RiskLevel::High => {
            "Recommendation: review each flagged cell with the workbook's owner before using \
             its outputs."
        }
        RiskLevel::Medium => {
            "Recommendation: spot-check the flagged cells; the remainder of the workbook \
             appears structurally sound."
        }
        RiskLevel::Low => {
            "Recommendation: no immediate action required; keep the flagged items in mind \
             during routine review."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crate::core::{HiddenSheet, OverrideFinding, Severity};

    fn assess(findings: &FindingSet) -> RiskAssessment {
        let config = AuditConfig::default();
        crate::risk::assess(findings, &config.scoring, &config.thresholds)
    }

    #[test]
    fn clean_workbook_gets_the_no_red_flags_message() {
        let findings = FindingSet::default();
        let narrative = render(&findings, &assess(&findings));
        assert_eq!(narrative, NO_RED_FLAGS);
    }

    #[test]
    fn narrative_is_deterministic() {
        let mut findings = FindingSet::default();
        findings.circular_references =
            vec!["Sheet1!A1".to_string(), "Sheet1!B1".to_string()];
        let assessment = assess(&findings);
        assert_eq!(
            render(&findings, &assessment),
            render(&findings, &assessment)
        );
    }

    #[test]
    fn hidden_only_workbook_mentions_hidden_in_the_opening() {
        let mut findings = FindingSet::default();
        findings.hidden_content.hidden_sheets = vec![HiddenSheet {
            name: "Shadow".to_string(),
            visibility: SheetVisibility::VeryHidden,
            row_count: 100,
            col_count: 10,
        }];
        let narrative = render(&findings, &assess(&findings));
        let opening_paragraph = narrative.split("\n\n").next().unwrap();
        assert!(opening_paragraph.contains("hidden"));
    }

    #[test]
    fn samples_are_capped_at_three() {
        let mut findings = FindingSet::default();
        findings.circular_references =
            (0..7).map(|i| format!("Sheet1!A{}", i + 1)).collect();
        let narrative = render(&findings, &assess(&findings));
        assert!(narrative.contains("(and 4 more)"));
    }

    #[test]
    fn override_details_appear_in_the_body() {
        let mut findings = FindingSet::default();
        findings.hardcoded_overrides = vec![OverrideFinding {
            cell: "Sheet1!B7".to_string(),
            severity: Severity::Critical,
            value: 50_000.0,
            is_round_number: true,
            column_header: Some("Revenue".to_string()),
            sample_formula: Some("=A7*2".to_string()),
            detail: "Sheet1!B7 holds the literal 50000".to_string(),
        }];
        let narrative = render(&findings, &assess(&findings));
        assert!(narrative.contains("Hardcoded overrides:"));
        assert!(narrative.contains("Sheet1!B7 holds the literal 50000"));
    }
}
