//! Loader behavior against a real workbook file, including the cell
//! ingestion ceiling.

use std::path::PathBuf;

use sheetaudit::{analyze_workbook, load_workbook, AuditConfig, CellValue, SheetVisibility};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn full_load_reads_both_sheets_with_visibility() {
    let config = AuditConfig::default();
    let workbook = load_workbook(&fixture("very_hidden.xlsx"), &config).unwrap();

    assert!(!workbook.truncated);
    assert_eq!(workbook.sheets.len(), 2);

    let data = &workbook.sheets[0];
    assert_eq!(data.name, "Data");
    assert_eq!(data.visibility, SheetVisibility::Visible);
    assert_eq!(data.cells.len(), 4);
    assert_eq!(
        data.cell("A", 1).map(|c| &c.value),
        Some(&CellValue::Number(1.0))
    );

    let backstage = &workbook.sheets[1];
    assert_eq!(backstage.name, "Backstage");
    assert_eq!(backstage.visibility, SheetVisibility::VeryHidden);
    assert_eq!(backstage.cells.len(), 2);
}

#[test]
fn ceiling_keeps_later_sheets_in_the_inventory() {
    let mut config = AuditConfig::default();
    config.thresholds.max_cells = 2;
    let workbook = load_workbook(&fixture("very_hidden.xlsx"), &config).unwrap();

    assert!(workbook.truncated);
    // The first sheet holds four cells, so ingestion stops inside it. The
    // second sheet must still be listed with its visibility and extents
    // even though its cells are not read.
    assert_eq!(workbook.sheets.len(), 2);

    let backstage = &workbook.sheets[1];
    assert_eq!(backstage.name, "Backstage");
    assert_eq!(backstage.visibility, SheetVisibility::VeryHidden);
    assert!(backstage.cells.is_empty());
    assert_eq!(backstage.max_row, 2);
    assert_eq!(backstage.max_col, 1);
}

#[test]
fn very_hidden_sheet_past_the_ceiling_still_scores() {
    let mut config = AuditConfig::default();
    config.thresholds.max_cells = 2;
    let workbook = load_workbook(&fixture("very_hidden.xlsx"), &config).unwrap();
    let report = analyze_workbook(&workbook, &config);

    assert_eq!(report.hidden_content.very_hidden_count(), 1);
    assert!(report.risk_assessment.score >= 15);
    assert!(report
        .risk_assessment
        .risk_factors
        .iter()
        .any(|f| f.name == "very_hidden_sheets"));
}
