//! Core data model shared by every analysis stage.
//!
//! Cells are produced once per workbook load and never mutated afterwards;
//! every analysis stage is a pure function over this model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized cell identity: `(sheet, column letters, row number)`.
///
/// Column letters are stored upper-cased with `$` anchors stripped, so two
/// references to the same cell always compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub sheet: String,
    pub col: String,
    pub row: u32,
}

impl CellRef {
    pub fn new(sheet: impl Into<String>, col: &str, row: u32) -> Self {
        Self {
            sheet: sheet.into(),
            col: col.replace('$', "").to_uppercase(),
            row,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}{}", self.sheet, self.col, self.row)
    }
}

/// Raw content of a populated cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Formula text including the leading `=`.
    Formula(String),
    Number(f64),
    Text(String),
    /// A spreadsheet error value such as `#REF!` or `#DIV/0!`.
    Error(String),
    Empty,
}

/// Derived classification of a cell's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Formula,
    NumericLiteral,
    TextLiteral,
    Error,
    Empty,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub col: String,
    pub row: u32,
    pub value: CellValue,
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match self.value {
            CellValue::Formula(_) => CellKind::Formula,
            CellValue::Number(_) => CellKind::NumericLiteral,
            CellValue::Text(_) => CellKind::TextLiteral,
            CellValue::Error(_) => CellKind::Error,
            CellValue::Empty => CellKind::Empty,
        }
    }

    pub fn formula(&self) -> Option<&str> {
        match &self.value {
            CellValue::Formula(f) => Some(f),
            _ => None,
        }
    }
}

/// Sheet visibility state as stored in the workbook.
///
/// `VeryHidden` is only settable programmatically and is not reachable
/// through the normal spreadsheet UI, which is why it carries a higher
/// implied suspicion everywhere it is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetVisibility {
    Visible,
    Hidden,
    VeryHidden,
}

impl fmt::Display for SheetVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SheetVisibility::Visible => "visible",
            SheetVisibility::Hidden => "hidden",
            SheetVisibility::VeryHidden => "very_hidden",
        };
        write!(f, "{s}")
    }
}

/// One worksheet with its populated cells and structural metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub visibility: SheetVisibility,
    pub max_row: u32,
    pub max_col: u32,
    pub cells: Vec<Cell>,
    /// 1-based indices of rows flagged hidden in the sheet metadata.
    pub hidden_rows: Vec<u32>,
    /// Column letters flagged hidden in the sheet metadata.
    pub hidden_cols: Vec<String>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: SheetVisibility::Visible,
            max_row: 0,
            max_col: 0,
            cells: Vec::new(),
            hidden_rows: Vec::new(),
            hidden_cols: Vec::new(),
        }
    }

    pub fn cell(&self, col: &str, row: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Header text for a column: the value of row 1, if present.
    pub fn header(&self, col: &str) -> Option<String> {
        self.cell(col, 1).and_then(|c| match &c.value {
            CellValue::Text(t) => Some(t.clone()),
            CellValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// A parsed workbook: the sole input to the analysis pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workbook {
    pub filename: String,
    pub sheets: Vec<Sheet>,
    pub has_vba: bool,
    pub defined_name_count: usize,
    /// True when the loader hit its `max_cells` ceiling and stopped early.
    pub truncated: bool,
}

impl Workbook {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            sheets: Vec::new(),
            has_vba: false,
            defined_name_count: 0,
            truncated: false,
        }
    }

    /// All formula-bearing cells as `(identity, formula text)` pairs.
    pub fn formula_cells(&self) -> Vec<(CellRef, &str)> {
        self.sheets
            .iter()
            .flat_map(|sheet| {
                sheet.cells.iter().filter_map(|cell| {
                    cell.formula()
                        .map(|f| (CellRef::new(sheet.name.clone(), &cell.col, cell.row), f))
                })
            })
            .collect()
    }
}

/// Column letters for a 1-based column index (`1` -> `A`, `27` -> `AA`).
pub fn column_letters(index: u32) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// 1-based column index for column letters (`A` -> `1`, `AA` -> `27`).
pub fn column_index(letters: &str) -> u32 {
    letters
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .fold(0u32, |acc, c| {
            acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
        })
}

/// Severity levels for findings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// One step up the scale, saturating at `Critical`.
    pub fn escalate(self) -> Self {
        match self {
            Severity::Info => Severity::Low,
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Finding categories produced by the analysis stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    CircularReference,
    FormulaInconsistency,
    HardcodedOverride,
    HiddenContent,
    ExcelError,
    VolatileFunctionCluster,
}

/// Per-formula inventory entry (stable output contract).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormulaInfo {
    pub cell: String,
    /// Formula text truncated to 500 characters.
    pub formula: String,
    /// Length of the untruncated formula.
    pub length: usize,
    pub functions: Vec<String>,
    pub references: Vec<String>,
    pub nesting_depth: u32,
}

/// A cell whose stored value is a spreadsheet error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorCell {
    pub cell: String,
    pub error: String,
    pub severity: Severity,
}

/// A formula that invokes one or more volatile functions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VolatileUse {
    pub cell: String,
    pub volatile_functions: Vec<String>,
}

/// Structural quality issue flagged during inventory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructuralIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub cell: String,
    pub detail: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    HighNesting,
    LongFormula,
}

/// A minority formula embedded in an otherwise consistent column.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InconsistencyFinding {
    pub cell: String,
    pub severity: Severity,
    pub formula: String,
    pub dominant_pattern: String,
    /// `dominant_count / column_total` for the column.
    pub adherence: f64,
    pub dominant_count: usize,
    pub column_total: usize,
    pub sample_dominant_formula: String,
    pub detail: String,
}

/// A numeric literal found where the column structure expected a formula.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverrideFinding {
    pub cell: String,
    pub severity: Severity,
    pub value: f64,
    /// Integer with absolute magnitude above the round-number threshold.
    pub is_round_number: bool,
    pub column_header: Option<String>,
    pub sample_formula: Option<String>,
    pub detail: String,
}

/// Inventory of hidden sheets, rows and columns.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HiddenContentReport {
    pub hidden_sheets: Vec<HiddenSheet>,
    pub hidden_rows: Vec<HiddenRun>,
    pub hidden_cols: Vec<HiddenRun>,
    /// Order-of-magnitude estimate, not an exact count.
    pub estimated_hidden_cells: u64,
}

impl HiddenContentReport {
    pub fn is_empty(&self) -> bool {
        self.hidden_sheets.is_empty()
            && self.hidden_rows.is_empty()
            && self.hidden_cols.is_empty()
    }

    pub fn very_hidden_count(&self) -> usize {
        self.hidden_sheets
            .iter()
            .filter(|s| s.visibility == SheetVisibility::VeryHidden)
            .count()
    }

    pub fn hidden_sheet_count(&self) -> usize {
        self.hidden_sheets
            .iter()
            .filter(|s| s.visibility == SheetVisibility::Hidden)
            .count()
    }

    pub fn hidden_row_count(&self) -> usize {
        self.hidden_rows.iter().map(|r| r.count).sum()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HiddenSheet {
    pub name: String,
    pub visibility: SheetVisibility,
    pub row_count: u32,
    pub col_count: u32,
}

/// Hidden rows or columns found on one sheet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HiddenRun {
    pub sheet: String,
    pub count: usize,
    pub sample: Vec<String>,
}

/// Workbook-level complexity metrics over the formula inventory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub total_formulas: usize,
    pub total_errors: usize,
    pub volatile_function_count: usize,
    pub avg_nesting_depth: f64,
    pub max_nesting_depth: u32,
    pub avg_formula_length: f64,
    pub max_formula_length: usize,
    pub unique_patterns: usize,
}

/// Everything the scoring engine consumes, aggregated from the five
/// independent analysis stages.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FindingSet {
    pub circular_references: Vec<String>,
    pub formula_inconsistencies: Vec<InconsistencyFinding>,
    pub hardcoded_overrides: Vec<OverrideFinding>,
    pub hidden_content: HiddenContentReport,
    pub errors_found: Vec<ErrorCell>,
    pub volatile_functions: Vec<VolatileUse>,
    pub has_vba: bool,
}

/// Overall risk classification derived from the 0-100 score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// One contributor to the aggregate risk score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub points: u32,
    pub detail: String,
}

/// Cell retained in the high-risk triage list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HighRiskCell {
    pub cell: String,
    pub severity: Severity,
    pub kind: FindingKind,
}

/// Derived risk summary; recomputed fresh on every run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
    pub high_risk_cells: Vec<HighRiskCell>,
}

/// Per-sheet structural summary carried through to the report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetSummary {
    pub name: String,
    pub visibility: SheetVisibility,
    pub row_count: u32,
    pub col_count: u32,
    pub headers_sample: Vec<String>,
}

/// The single structured result produced for downstream consumers.
///
/// Field names are the stable serialization contract; the boundary layer
/// serializes this as-is with no further transformation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditReport {
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub sheets: Vec<SheetSummary>,
    pub formulas: Vec<FormulaInfo>,
    pub function_usage: BTreeMap<String, usize>,
    pub function_categories: BTreeMap<String, usize>,
    pub volatile_functions: Vec<VolatileUse>,
    pub errors_found: Vec<ErrorCell>,
    pub issues: Vec<StructuralIssue>,
    pub external_links: Vec<String>,
    pub complexity_metrics: ComplexityMetrics,
    pub inferred_purpose: String,
    pub circular_references: Vec<String>,
    pub formula_inconsistencies: Vec<InconsistencyFinding>,
    pub hardcoded_overrides: Vec<OverrideFinding>,
    pub hidden_content: HiddenContentReport,
    pub has_vba: bool,
    pub defined_name_count: usize,
    pub truncated: bool,
    pub risk_assessment: RiskAssessment,
    pub narrative: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_ref_normalizes_anchors_and_case() {
        let r = CellRef::new("Sheet1", "$b", 17);
        assert_eq!(r.to_string(), "Sheet1!B17");
    }

    #[test]
    fn column_letter_round_trip() {
        for (index, letters) in [(1, "A"), (26, "Z"), (27, "AA"), (52, "AZ"), (703, "AAA")] {
            assert_eq!(column_letters(index), letters);
            assert_eq!(column_index(letters), index);
        }
    }

    #[test]
    fn severity_escalation_saturates() {
        assert_eq!(Severity::High.escalate(), Severity::Critical);
        assert_eq!(Severity::Critical.escalate(), Severity::Critical);
        assert_eq!(Severity::Medium.escalate(), Severity::High);
    }

    #[test]
    fn header_prefers_row_one_value() {
        let mut sheet = Sheet::new("Data");
        sheet.cells.push(Cell {
            col: "B".to_string(),
            row: 1,
            value: CellValue::Text("Revenue".to_string()),
        });
        assert_eq!(sheet.header("B").as_deref(), Some("Revenue"));
        assert_eq!(sheet.header("C"), None);
    }
}
