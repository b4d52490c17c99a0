//! Hidden-content audit.
//!
//! Inventories hidden and very-hidden sheets plus hidden rows and columns.
//! Scans are capped per sheet to keep cost linear on very large sheets, and
//! the hidden-cell total is an order-of-magnitude estimate built from fixed
//! density assumptions, not an exact count; scoring only needs magnitude.

use crate::config::AuditConfig;
use crate::core::{
    column_index, HiddenContentReport, HiddenRun, HiddenSheet, SheetVisibility, Workbook,
};

const RUN_SAMPLE_LIMIT: usize = 10;

pub fn audit_hidden_content(workbook: &Workbook, config: &AuditConfig) -> HiddenContentReport {
    let thresholds = &config.thresholds;
    let mut report = HiddenContentReport::default();
    let mut estimated: u64 = 0;

    for sheet in &workbook.sheets {
        if sheet.visibility != SheetVisibility::Visible {
            report.hidden_sheets.push(HiddenSheet {
                name: sheet.name.clone(),
                visibility: sheet.visibility,
                row_count: sheet.max_row,
                col_count: sheet.max_col,
            });
            estimated += u64::from(sheet.max_row) * u64::from(sheet.max_col);
        }

        let mut hidden_rows: Vec<u32> = sheet
            .hidden_rows
            .iter()
            .copied()
            .filter(|&row| row <= thresholds.hidden_row_scan_limit)
            .collect();
        hidden_rows.sort_unstable();
        if !hidden_rows.is_empty() {
            estimated += hidden_rows.len() as u64 * thresholds.cells_per_hidden_row;
            report.hidden_rows.push(HiddenRun {
                sheet: sheet.name.clone(),
                count: hidden_rows.len(),
                sample: hidden_rows
                    .iter()
                    .take(RUN_SAMPLE_LIMIT)
                    .map(|row| format!("row {row}"))
                    .collect(),
            });
        }

        let mut hidden_cols: Vec<&String> = sheet
            .hidden_cols
            .iter()
            .filter(|col| column_index(col) <= thresholds.hidden_col_scan_limit)
            .collect();
        hidden_cols.sort_by_key(|col| column_index(col));
        if !hidden_cols.is_empty() {
            estimated += hidden_cols.len() as u64 * thresholds.rows_per_hidden_col;
            report.hidden_cols.push(HiddenRun {
                sheet: sheet.name.clone(),
                count: hidden_cols.len(),
                sample: hidden_cols
                    .iter()
                    .take(RUN_SAMPLE_LIMIT)
                    .map(|col| format!("column {col}"))
                    .collect(),
            });
        }
    }

    report.estimated_hidden_cells = estimated;
    report
}
