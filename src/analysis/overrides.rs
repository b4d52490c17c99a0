//! Hardcoded override detection.
//!
//! A numeric literal sitting inside a column that is otherwise driven by
//! formulas is the classic signature of a pasted-over result. Columns that
//! are mostly hardcoded data are normal and never flagged.

use std::collections::BTreeMap;

use crate::analysis::consistency::{classify_neighborhood, Neighborhood};
use crate::config::AuditConfig;
use crate::core::{CellRef, CellValue, OverrideFinding, Severity, Workbook};

pub fn detect_overrides(workbook: &Workbook, config: &AuditConfig) -> Vec<OverrideFinding> {
    let thresholds = &config.thresholds;
    let mut findings = Vec::new();

    for sheet in &workbook.sheets {
        // Collect first, then group: formulas and numeric literals per
        // column, header row excluded.
        let mut formulas: BTreeMap<&str, Vec<(u32, &str)>> = BTreeMap::new();
        let mut literals: BTreeMap<&str, Vec<(u32, f64)>> = BTreeMap::new();
        for cell in &sheet.cells {
            if cell.row == 1 {
                continue;
            }
            match &cell.value {
                CellValue::Formula(f) => {
                    formulas.entry(&cell.col).or_default().push((cell.row, f));
                }
                CellValue::Number(n) => {
                    literals.entry(&cell.col).or_default().push((cell.row, *n));
                }
                _ => {}
            }
        }

        for (col, column_literals) in &literals {
            let column_formulas = formulas.get(col).map(Vec::as_slice).unwrap_or(&[]);
            let populated = column_formulas.len() + column_literals.len();
            if populated < thresholds.min_populated_cells {
                continue;
            }
            let formula_fraction = column_formulas.len() as f64 / populated as f64;
            if formula_fraction < thresholds.formula_fraction {
                // Mostly hardcoded data; not an anomaly.
                continue;
            }

            let mut formula_rows: Vec<u32> =
                column_formulas.iter().map(|(row, _)| *row).collect();
            formula_rows.sort_unstable();
            let header = sheet.header(col);

            for (row, value) in column_literals {
                let base = match classify_neighborhood(*row, &formula_rows) {
                    Neighborhood::Surrounded => Severity::Critical,
                    Neighborhood::OneSided => Severity::High,
                    Neighborhood::Isolated => continue,
                };
                let is_round_number =
                    value.fract() == 0.0 && value.abs() > thresholds.round_number_threshold;
                let severity = if is_round_number { base.escalate() } else { base };
                let sample_formula =
                    nearest_formula(*row, column_formulas).map(str::to_string);

                let cell = CellRef::new(sheet.name.clone(), col, *row).to_string();
                let context = header
                    .as_deref()
                    .map(|h| format!(" (\"{h}\")"))
                    .unwrap_or_default();
                findings.push(OverrideFinding {
                    detail: format!(
                        "{cell} holds the literal {value} in formula column {col}{context}; \
                         {}/{populated} neighboring cells compute their value{}",
                        column_formulas.len(),
                        sample_formula
                            .as_deref()
                            .map(|f| format!(", e.g. {f}"))
                            .unwrap_or_default(),
                    ),
                    cell,
                    severity,
                    value: *value,
                    is_round_number,
                    column_header: header.clone(),
                    sample_formula,
                });
            }
        }
    }

    findings
}

/// Formula in the same column closest by row distance, for comparison in
/// the finding narrative.
fn nearest_formula<'a>(row: u32, formulas: &[(u32, &'a str)]) -> Option<&'a str> {
    formulas
        .iter()
        .min_by_key(|(r, _)| r.abs_diff(row))
        .map(|(_, f)| *f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Cell, Sheet};
    use pretty_assertions::assert_eq;

    fn formula(col: &str, row: u32, text: &str) -> Cell {
        Cell {
            col: col.to_string(),
            row,
            value: CellValue::Formula(text.to_string()),
        }
    }

    fn number(col: &str, row: u32, value: f64) -> Cell {
        Cell {
            col: col.to_string(),
            row,
            value: CellValue::Number(value),
        }
    }

    fn text(col: &str, row: u32, value: &str) -> Cell {
        Cell {
            col: col.to_string(),
            row,
            value: CellValue::Text(value.to_string()),
        }
    }

    fn workbook_with(cells: Vec<Cell>) -> Workbook {
        let mut sheet = Sheet::new("Sheet1");
        sheet.cells = cells;
        let mut workbook = Workbook::new("test.xlsx");
        workbook.sheets.push(sheet);
        workbook
    }

    fn formula_column_with_literal(literal_row: u32, value: f64) -> Vec<Cell> {
        let mut cells = vec![text("B", 1, "Projected Revenue")];
        for row in 2..=11 {
            if row == literal_row {
                cells.push(number("B", row, value));
            } else {
                cells.push(formula("B", row, &format!("=A{row}*2")));
            }
        }
        cells
    }

    #[test]
    fn surrounded_round_large_literal_is_critical() {
        let workbook = workbook_with(formula_column_with_literal(7, 50_000.0));
        let findings = detect_overrides(&workbook, &AuditConfig::default());
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.cell, "Sheet1!B7");
        assert_eq!(finding.severity, Severity::Critical);
        assert!(finding.is_round_number);
        assert_eq!(finding.column_header.as_deref(), Some("Projected Revenue"));
        assert!(finding.sample_formula.is_some());
    }

    #[test]
    fn small_fractional_literal_is_not_escalated() {
        let workbook = workbook_with(formula_column_with_literal(7, 42.5));
        let findings = detect_overrides(&workbook, &AuditConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical); // surrounded
        assert!(!findings[0].is_round_number);
    }

    #[test]
    fn one_sided_literal_is_high_and_escalates_when_round() {
        let workbook = workbook_with(formula_column_with_literal(11, 42.5));
        let findings = detect_overrides(&workbook, &AuditConfig::default());
        assert_eq!(findings[0].severity, Severity::High);

        let workbook = workbook_with(formula_column_with_literal(11, 99_999.0));
        let findings = detect_overrides(&workbook, &AuditConfig::default());
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[0].is_round_number);
    }

    #[test]
    fn mostly_literal_columns_are_ignored() {
        let mut cells = vec![formula("B", 2, "=A2*2")];
        for row in 3..=8 {
            cells.push(number("B", row, row as f64));
        }
        let workbook = workbook_with(cells);
        assert!(detect_overrides(&workbook, &AuditConfig::default()).is_empty());
    }

    #[test]
    fn small_columns_are_ignored() {
        let workbook = workbook_with(vec![
            formula("B", 2, "=A2*2"),
            formula("B", 3, "=A3*2"),
            number("B", 4, 10.0),
        ]);
        assert!(detect_overrides(&workbook, &AuditConfig::default()).is_empty());
    }

    #[test]
    fn header_row_is_excluded_from_the_partition() {
        // Row 1 holds a number; it must count neither as literal nor formula.
        let mut cells = vec![number("B", 1, 2024.0)];
        for row in 2..=11 {
            cells.push(formula("B", row, &format!("=A{row}*2")));
        }
        cells.push(number("B", 12, 7.0));
        let workbook = workbook_with(cells);
        let findings = detect_overrides(&workbook, &AuditConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].cell, "Sheet1!B12");
    }

    #[test]
    fn literal_with_no_formula_neighbors_on_either_side_is_suppressed() {
        // Column whose only literal sits alone past... both sides empty of
        // formulas cannot happen with a qualifying ratio unless the literal
        // is the entire column, so exercise via a custom threshold column:
        let mut config = AuditConfig::default();
        config.thresholds.min_populated_cells = 1;
        config.thresholds.formula_fraction = 0.0;
        let workbook = workbook_with(vec![number("B", 5, 10.0)]);
        assert!(detect_overrides(&workbook, &config).is_empty());
    }
}
