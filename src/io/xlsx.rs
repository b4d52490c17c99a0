//! Workbook ingestion via calamine.
//!
//! The loader is the only component that touches the filesystem; it maps an
//! xlsx/xlsm file into the format-agnostic [`Workbook`] model the analysis
//! pipeline consumes. A corrupt sheet is logged and kept in the inventory
//! without cells rather than failing the run; only a workbook-level load
//! failure aborts. Every sheet named in the workbook metadata appears in
//! the inventory even when the cell ceiling cuts ingestion short, so the
//! hidden-content audit always sees the full sheet list.
//!
//! Row/column hidden flags are not exposed by the reader, so `hidden_rows`
//! and `hidden_cols` stay empty for loaded files; the hidden-content audit
//! still covers sheet visibility, which the format does expose.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, SheetVisible, Xlsx};

use crate::config::AuditConfig;
use crate::core::{column_letters, Cell, CellValue, Sheet, SheetVisibility, Workbook};
use crate::error::{AuditError, AuditResult};

pub fn load_workbook(path: &Path, config: &AuditConfig) -> AuditResult<Workbook> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if extension != "xlsx" && extension != "xlsm" {
        return Err(AuditError::UnsupportedFormat(extension));
    }

    let mut reader: Xlsx<BufReader<File>> = open_workbook(path).map_err(|e: calamine::XlsxError| AuditError::Load {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("workbook")
        .to_string();
    let mut workbook = Workbook::new(filename);
    workbook.has_vba = reader.vba_project().is_some();
    workbook.defined_name_count = reader.defined_names().len();

    let max_cells = config.thresholds.max_cells;
    let mut cells_seen: usize = 0;
    let metadata: Vec<(String, SheetVisible)> = reader
        .sheets_metadata()
        .iter()
        .map(|s| (s.name.clone(), s.visible))
        .collect();

    for (name, visible) in metadata {
        let mut sheet = Sheet::new(name.clone());
        sheet.visibility = map_visibility(visible);

        // Once the cell ceiling is hit, later sheets still enter the
        // inventory with their name, visibility and dimensions; only their
        // cell contents are skipped.
        let ingest_cells = !workbook.truncated;

        // Keyed by (row, col) so formula text can overlay cached values.
        let mut contents: BTreeMap<(u32, u32), CellValue> = BTreeMap::new();

        match reader.worksheet_range(&name) {
            Ok(range) => {
                let (start_row, start_col) = range.start().unwrap_or((0, 0));
                let (rows, cols) = range.get_size();
                sheet.max_row = start_row + rows as u32;
                sheet.max_col = start_col + cols as u32;
                if ingest_cells {
                    for (row, col, data) in range.used_cells() {
                        if cells_seen >= max_cells {
                            workbook.truncated = true;
                            break;
                        }
                        cells_seen += 1;
                        if let Some(value) = map_value(data) {
                            contents
                                .insert((start_row + row as u32, start_col + col as u32), value);
                        }
                    }
                }
            }
            Err(e) => {
                log::warn!("cells unavailable for corrupt sheet '{name}': {e}");
            }
        }

        if ingest_cells {
            match reader.worksheet_formula(&name) {
                Ok(range) => {
                    let (start_row, start_col) = range.start().unwrap_or((0, 0));
                    for (row, col, formula) in range.used_cells() {
                        if formula.is_empty() {
                            continue;
                        }
                        let key = (start_row + row as u32, start_col + col as u32);
                        // Past the ceiling the overlay only upgrades cells
                        // that were already scanned.
                        if workbook.truncated && !contents.contains_key(&key) {
                            continue;
                        }
                        contents.insert(key, CellValue::Formula(format!("={formula}")));
                    }
                }
                Err(e) => {
                    log::warn!("formulas unavailable for sheet '{name}': {e}");
                }
            }
        }

        sheet.cells = contents
            .into_iter()
            .map(|((row, col), value)| Cell {
                col: column_letters(col + 1),
                row: row + 1,
                value,
            })
            .collect();
        workbook.sheets.push(sheet);
    }

    Ok(workbook)
}

fn map_visibility(visible: SheetVisible) -> SheetVisibility {
    match visible {
        SheetVisible::Visible => SheetVisibility::Visible,
        SheetVisible::Hidden => SheetVisibility::Hidden,
        SheetVisible::VeryHidden => SheetVisibility::VeryHidden,
    }
}

/// Map a cached cell value into the analysis model. Formula text arrives
/// through the separate formula range and overlays these afterwards.
fn map_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::String(s) => {
            if s.starts_with('=') {
                Some(CellValue::Formula(s.clone()))
            } else {
                Some(CellValue::Text(s.clone()))
            }
        }
        Data::Bool(b) => Some(CellValue::Text(b.to_string())),
        Data::Error(e) => Some(CellValue::Error(e.to_string())),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}
