//! Analysis pipeline orchestration.
//!
//! Dependency graph, column consistency, override detection and the hidden
//! content audit are independent passes over the shared read-only workbook;
//! only the final aggregation depends on all of them.

pub mod consistency;
pub mod hidden;
pub mod inventory;
pub mod overrides;

use chrono::Utc;

use crate::config::AuditConfig;
use crate::core::{AuditReport, CellValue, FindingSet, SheetSummary, Workbook};
use crate::graph::DependencyGraph;
use crate::risk;

const HEADER_SAMPLE_COLS: u32 = 25;
const HEADER_SAMPLE_LEN: usize = 50;

/// Run the full pipeline over a parsed workbook.
pub fn analyze_workbook(workbook: &Workbook, config: &AuditConfig) -> AuditReport {
    let inventory = inventory::build_inventory(workbook, config);

    let formula_cells = workbook.formula_cells();
    let graph = DependencyGraph::build(&formula_cells);
    let circular_references: Vec<String> = graph
        .cycle_cells()
        .iter()
        .map(ToString::to_string)
        .collect();
    log::debug!(
        "dependency graph: {} nodes, {} edges, {} cells in cycles",
        graph.node_count(),
        graph.edge_count(),
        circular_references.len()
    );

    let formula_inconsistencies = consistency::analyze_consistency(workbook, config);
    let hardcoded_overrides = overrides::detect_overrides(workbook, config);
    let hidden_content = hidden::audit_hidden_content(workbook, config);

    let findings = FindingSet {
        circular_references,
        formula_inconsistencies,
        hardcoded_overrides,
        hidden_content,
        errors_found: inventory.errors_found.clone(),
        volatile_functions: inventory.volatile_functions.clone(),
        has_vba: workbook.has_vba,
    };

    let risk_assessment = risk::assess(&findings, &config.scoring, &config.thresholds);
    let narrative = risk::narrative::render(&findings, &risk_assessment);

    AuditReport {
        filename: workbook.filename.clone(),
        timestamp: Utc::now(),
        sheets: workbook.sheets.iter().map(summarize_sheet).collect(),
        formulas: inventory.formulas,
        function_usage: inventory.function_usage,
        function_categories: inventory.function_categories,
        volatile_functions: findings.volatile_functions,
        errors_found: findings.errors_found,
        issues: inventory.issues,
        external_links: inventory.external_links,
        complexity_metrics: inventory.complexity_metrics,
        inferred_purpose: inventory.inferred_purpose,
        circular_references: findings.circular_references,
        formula_inconsistencies: findings.formula_inconsistencies,
        hardcoded_overrides: findings.hardcoded_overrides,
        hidden_content: findings.hidden_content,
        has_vba: workbook.has_vba,
        defined_name_count: workbook.defined_name_count,
        truncated: workbook.truncated,
        risk_assessment,
        narrative,
    }
}

fn summarize_sheet(sheet: &crate::core::Sheet) -> SheetSummary {
    let mut headers = Vec::new();
    for cell in &sheet.cells {
        if cell.row != 1 || crate::core::column_index(&cell.col) > HEADER_SAMPLE_COLS {
            continue;
        }
        let text = match &cell.value {
            CellValue::Text(t) => t.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Formula(f) => f.clone(),
            _ => continue,
        };
        headers.push((
            crate::core::column_index(&cell.col),
            text.chars().take(HEADER_SAMPLE_LEN).collect::<String>(),
        ));
    }
    headers.sort_by_key(|(index, _)| *index);

    SheetSummary {
        name: sheet.name.clone(),
        visibility: sheet.visibility,
        row_count: sheet.max_row,
        col_count: sheet.max_col,
        headers_sample: headers.into_iter().map(|(_, text)| text).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Cell, Sheet};
    use pretty_assertions::assert_eq;

    #[test]
    fn sheet_summary_orders_headers_by_column() {
        let mut sheet = Sheet::new("Data");
        sheet.max_row = 5;
        sheet.max_col = 3;
        sheet.cells = vec![
            Cell {
                col: "C".to_string(),
                row: 1,
                value: CellValue::Text("Margin".to_string()),
            },
            Cell {
                col: "A".to_string(),
                row: 1,
                value: CellValue::Text("Month".to_string()),
            },
            Cell {
                col: "B".to_string(),
                row: 2,
                value: CellValue::Text("not a header".to_string()),
            },
        ];
        let summary = summarize_sheet(&sheet);
        assert_eq!(summary.headers_sample, vec!["Month", "Margin"]);
    }
}
