//! Risk scoring: a pure function from the aggregated findings to a 0-100
//! score with a categorical level.
//!
//! Additive point model with per-category caps, evaluated category by
//! category, then clamped to [0, 100]. Very-hidden sheets are deliberately
//! uncapped: programmatically hidden content is maximally suspicious.

pub mod narrative;

use crate::config::{AnalysisThresholds, ScoringRules};
use crate::core::{
    FindingKind, FindingSet, HighRiskCell, RiskAssessment, RiskFactor, RiskLevel, Severity,
};

pub fn assess(
    findings: &FindingSet,
    rules: &ScoringRules,
    thresholds: &AnalysisThresholds,
) -> RiskAssessment {
    let mut factors: Vec<RiskFactor> = Vec::new();
    let mut add = |name: &str, points: u32, detail: String| {
        if points > 0 {
            factors.push(RiskFactor {
                name: name.to_string(),
                points,
                detail,
            });
        }
    };

    let circular = findings.circular_references.len() as u32;
    add(
        "circular_references",
        (rules.circular_points * circular).min(rules.circular_cap),
        format!("{circular} cells in circular dependency chains"),
    );

    let critical_inconsistencies = findings
        .formula_inconsistencies
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count() as u32;
    let total_inconsistencies = findings.formula_inconsistencies.len() as u32;
    // The critical scale floors at the total scale; otherwise a workbook
    // could score lower by acquiring a critical finding.
    let critical_score = (rules.inconsistency_critical_points * critical_inconsistencies)
        .min(rules.inconsistency_critical_cap);
    let total_score =
        (rules.inconsistency_points * total_inconsistencies).min(rules.inconsistency_cap);
    let detail = if critical_inconsistencies > 0 {
        format!(
            "{total_inconsistencies} formulas deviate from their column pattern, \
             {critical_inconsistencies} critical"
        )
    } else {
        format!("{total_inconsistencies} formulas deviate from their column pattern")
    };
    add(
        "formula_inconsistencies",
        critical_score.max(total_score),
        detail,
    );

    let serious_overrides = findings
        .hardcoded_overrides
        .iter()
        .filter(|f| f.severity >= Severity::High)
        .count() as u32;
    add(
        "hardcoded_overrides",
        (rules.override_points * serious_overrides).min(rules.override_cap),
        format!("{serious_overrides} literals pasted over formula columns"),
    );

    let very_hidden = findings.hidden_content.very_hidden_count() as u32;
    add(
        "very_hidden_sheets",
        rules.very_hidden_points * very_hidden,
        format!("{very_hidden} sheets hidden beyond the normal UI"),
    );

    let hidden_sheets = findings.hidden_content.hidden_sheet_count() as u32;
    add(
        "hidden_sheets",
        rules.hidden_sheet_points * hidden_sheets,
        format!("{hidden_sheets} hidden sheets"),
    );

    let hidden_rows = findings.hidden_content.hidden_row_count();
    if hidden_rows > rules.hidden_rows_min {
        add(
            "hidden_rows",
            (hidden_rows as u32 / 2).min(rules.hidden_rows_cap),
            format!("{hidden_rows} hidden rows"),
        );
    }

    let errors = findings.errors_found.len() as u32;
    add(
        "spreadsheet_errors",
        (rules.error_points * errors).min(rules.error_cap),
        format!("{errors} cells contain error values"),
    );

    if findings.volatile_functions.len() > thresholds.volatile_cluster_min {
        add(
            "volatile_functions",
            rules.volatile_bonus,
            format!(
                "{} cells use volatile functions that recalculate constantly",
                findings.volatile_functions.len()
            ),
        );
    }

    if findings.has_vba {
        add(
            "macro_code",
            rules.vba_bonus,
            "workbook contains VBA macro code".to_string(),
        );
    }

    let score = factors.iter().map(|f| f.points).sum::<u32>().min(100);
    let risk_level = level_for(score, rules);
    factors.sort_by(|a, b| b.points.cmp(&a.points).then(a.name.cmp(&b.name)));

    RiskAssessment {
        score,
        risk_level,
        risk_factors: factors,
        high_risk_cells: high_risk_cells(findings, rules.high_risk_cell_limit),
    }
}

fn level_for(score: u32, rules: &ScoringRules) -> RiskLevel {
    if score >= rules.critical_threshold {
        RiskLevel::Critical
    } else if score >= rules.high_threshold {
        RiskLevel::High
    } else if score >= rules.medium_threshold {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Top cells for quick triage, drawn from inconsistency and override
/// findings only, highest severity first.
fn high_risk_cells(findings: &FindingSet, limit: usize) -> Vec<HighRiskCell> {
    let mut cells: Vec<HighRiskCell> = findings
        .formula_inconsistencies
        .iter()
        .map(|f| HighRiskCell {
            cell: f.cell.clone(),
            severity: f.severity,
            kind: FindingKind::FormulaInconsistency,
        })
        .chain(findings.hardcoded_overrides.iter().map(|f| HighRiskCell {
            cell: f.cell.clone(),
            severity: f.severity,
            kind: FindingKind::HardcodedOverride,
        }))
        .collect();
    cells.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.cell.cmp(&b.cell)));
    cells.truncate(limit);
    cells
}
