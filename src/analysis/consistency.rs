//! Per-column formula consistency analysis ("the smoking gun detector").
//!
//! A minority formula embedded inside an otherwise consistent column-wise
//! series looks like a deliberate override; the same mismatch at a column
//! boundary could be a legitimate different first or last row, so edge
//! anomalies are suppressed.

use std::collections::BTreeMap;

use crate::config::AuditConfig;
use crate::core::{CellRef, InconsistencyFinding, Severity, Workbook};
use crate::formula::normalize_pattern;

/// Position of an anomalous row relative to the rows carrying the dominant
/// pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Neighborhood {
    Surrounded,
    OneSided,
    Isolated,
}

pub(crate) fn classify_neighborhood(row: u32, dominant_rows: &[u32]) -> Neighborhood {
    let above = dominant_rows.iter().any(|&r| r < row);
    let below = dominant_rows.iter().any(|&r| r > row);
    match (above, below) {
        (true, true) => Neighborhood::Surrounded,
        (true, false) | (false, true) => Neighborhood::OneSided,
        (false, false) => Neighborhood::Isolated,
    }
}

pub fn analyze_consistency(
    workbook: &Workbook,
    config: &AuditConfig,
) -> Vec<InconsistencyFinding> {
    let thresholds = &config.thresholds;
    let mut findings = Vec::new();

    for sheet in &workbook.sheets {
        // Two-step build: collect formula cells, then group by column.
        let mut columns: BTreeMap<&str, Vec<(u32, &str)>> = BTreeMap::new();
        for cell in &sheet.cells {
            if let Some(formula) = cell.formula() {
                columns.entry(&cell.col).or_default().push((cell.row, formula));
            }
        }

        for (col, mut cells) in columns {
            if cells.len() < thresholds.min_column_formulas {
                continue;
            }
            cells.sort_by_key(|(row, _)| *row);

            let mut by_signature: BTreeMap<String, Vec<(u32, &str)>> = BTreeMap::new();
            for (row, formula) in &cells {
                by_signature
                    .entry(normalize_pattern(formula))
                    .or_default()
                    .push((*row, formula));
            }

            let total = cells.len();
            let Some((dominant_signature, dominant_cells)) = by_signature
                .iter()
                .max_by_key(|(signature, members)| (members.len(), *signature))
            else {
                continue;
            };
            let dominant_count = dominant_cells.len();
            if (dominant_count as f64) < thresholds.dominance_ratio * total as f64 {
                continue;
            }

            let dominant_rows: Vec<u32> = dominant_cells.iter().map(|(row, _)| *row).collect();
            let sample_dominant = dominant_cells[0].1.to_string();
            let adherence = dominant_count as f64 / total as f64;

            for (signature, members) in &by_signature {
                if signature == dominant_signature || members.len() > thresholds.minority_max {
                    continue;
                }
                for (row, formula) in members {
                    let severity = match classify_neighborhood(*row, &dominant_rows) {
                        Neighborhood::Surrounded => Severity::Critical,
                        Neighborhood::OneSided => Severity::High,
                        Neighborhood::Isolated => continue,
                    };
                    let cell = CellRef::new(sheet.name.clone(), col, *row).to_string();
                    findings.push(InconsistencyFinding {
                        detail: format!(
                            "{cell} contains {formula}, breaking the dominant pattern \
                             {dominant_signature} followed by {dominant_count}/{total} cells \
                             ({:.0}% adherence); compare {sample_dominant}",
                            adherence * 100.0
                        ),
                        cell,
                        severity,
                        formula: formula.to_string(),
                        dominant_pattern: dominant_signature.clone(),
                        adherence,
                        dominant_count,
                        column_total: total,
                        sample_dominant_formula: sample_dominant.clone(),
                    });
                }
            }
        }
    }

    findings
}
