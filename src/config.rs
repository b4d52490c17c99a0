//! Analysis configuration.
//!
//! All tunable constants live here as explicit data passed into the
//! analysis and scoring components, so test suites can substitute
//! alternate thresholds without touching the production defaults.
//! An optional `.sheetaudit.toml` next to (or above) the analyzed file
//! overrides individual fields.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::{AuditError, AuditResult};

/// Thresholds controlling the individual analysis stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisThresholds {
    /// Minimum formula cells per column before consistency analysis runs.
    #[serde(default = "default_min_column_formulas")]
    pub min_column_formulas: usize,

    /// Fraction of a column the dominant signature must cover.
    #[serde(default = "default_dominance_ratio")]
    pub dominance_ratio: f64,

    /// Maximum occurrences for a signature to count as a minority anomaly.
    #[serde(default = "default_minority_max")]
    pub minority_max: usize,

    /// Minimum populated cells per column before override detection runs.
    #[serde(default = "default_min_populated_cells")]
    pub min_populated_cells: usize,

    /// Fraction of formula cells a column needs before a literal is suspect.
    #[serde(default = "default_formula_fraction")]
    pub formula_fraction: f64,

    /// Integer literals above this magnitude are "round and large".
    #[serde(default = "default_round_number_threshold")]
    pub round_number_threshold: f64,

    /// Nesting depth above which a formula is flagged.
    #[serde(default = "default_high_nesting_depth")]
    pub high_nesting_depth: u32,

    /// Formula length above which a formula is flagged.
    #[serde(default = "default_long_formula_length")]
    pub long_formula_length: usize,

    /// Stored formula text is truncated to this many characters.
    #[serde(default = "default_formula_truncate_len")]
    pub formula_truncate_len: usize,

    /// References retained per inventory entry.
    #[serde(default = "default_max_references")]
    pub max_references: usize,

    /// Rows scanned per sheet when auditing hidden rows.
    #[serde(default = "default_hidden_row_scan_limit")]
    pub hidden_row_scan_limit: u32,

    /// Columns scanned per sheet when auditing hidden columns.
    #[serde(default = "default_hidden_col_scan_limit")]
    pub hidden_col_scan_limit: u32,

    /// Assumed populated cells per hidden row (estimate only).
    #[serde(default = "default_cells_per_hidden_row")]
    pub cells_per_hidden_row: u64,

    /// Assumed populated cells per hidden column (estimate only).
    #[serde(default = "default_rows_per_hidden_col")]
    pub rows_per_hidden_col: u64,

    /// Ingestion ceiling; the loader stops and sets `truncated` past this.
    #[serde(default = "default_max_cells")]
    pub max_cells: usize,

    /// Volatile-function occurrences above this add a flat score bump.
    #[serde(default = "default_volatile_cluster_min")]
    pub volatile_cluster_min: usize,

    /// Distinct external-link targets retained.
    #[serde(default = "default_external_link_cap")]
    pub external_link_cap: usize,
}

fn default_min_column_formulas() -> usize {
    3
}
fn default_dominance_ratio() -> f64 {
    0.7
}
fn default_minority_max() -> usize {
    2
}
fn default_min_populated_cells() -> usize {
    5
}
fn default_formula_fraction() -> f64 {
    0.7
}
fn default_round_number_threshold() -> f64 {
    10_000.0
}
fn default_high_nesting_depth() -> u32 {
    3
}
fn default_long_formula_length() -> usize {
    200
}
fn default_formula_truncate_len() -> usize {
    500
}
fn default_max_references() -> usize {
    20
}
fn default_hidden_row_scan_limit() -> u32 {
    1000
}
fn default_hidden_col_scan_limit() -> u32 {
    50
}
fn default_cells_per_hidden_row() -> u64 {
    50
}
fn default_rows_per_hidden_col() -> u64 {
    100
}
fn default_max_cells() -> usize {
    50_000
}
fn default_volatile_cluster_min() -> usize {
    10
}
fn default_external_link_cap() -> usize {
    20
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            min_column_formulas: default_min_column_formulas(),
            dominance_ratio: default_dominance_ratio(),
            minority_max: default_minority_max(),
            min_populated_cells: default_min_populated_cells(),
            formula_fraction: default_formula_fraction(),
            round_number_threshold: default_round_number_threshold(),
            high_nesting_depth: default_high_nesting_depth(),
            long_formula_length: default_long_formula_length(),
            formula_truncate_len: default_formula_truncate_len(),
            max_references: default_max_references(),
            hidden_row_scan_limit: default_hidden_row_scan_limit(),
            hidden_col_scan_limit: default_hidden_col_scan_limit(),
            cells_per_hidden_row: default_cells_per_hidden_row(),
            rows_per_hidden_col: default_rows_per_hidden_col(),
            max_cells: default_max_cells(),
            volatile_cluster_min: default_volatile_cluster_min(),
            external_link_cap: default_external_link_cap(),
        }
    }
}

/// Point values and caps for the additive risk score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRules {
    #[serde(default = "default_circular_points")]
    pub circular_points: u32,
    #[serde(default = "default_circular_cap")]
    pub circular_cap: u32,

    #[serde(default = "default_inconsistency_critical_points")]
    pub inconsistency_critical_points: u32,
    #[serde(default = "default_inconsistency_critical_cap")]
    pub inconsistency_critical_cap: u32,
    #[serde(default = "default_inconsistency_points")]
    pub inconsistency_points: u32,
    #[serde(default = "default_inconsistency_cap")]
    pub inconsistency_cap: u32,

    #[serde(default = "default_override_points")]
    pub override_points: u32,
    #[serde(default = "default_override_cap")]
    pub override_cap: u32,

    /// Deliberately uncapped: very-hidden sheets are maximally suspicious.
    #[serde(default = "default_very_hidden_points")]
    pub very_hidden_points: u32,
    #[serde(default = "default_hidden_sheet_points")]
    pub hidden_sheet_points: u32,

    /// Hidden rows only score past this count.
    #[serde(default = "default_hidden_rows_min")]
    pub hidden_rows_min: usize,
    #[serde(default = "default_hidden_rows_cap")]
    pub hidden_rows_cap: u32,

    #[serde(default = "default_error_points")]
    pub error_points: u32,
    #[serde(default = "default_error_cap")]
    pub error_cap: u32,

    #[serde(default = "default_volatile_bonus")]
    pub volatile_bonus: u32,
    #[serde(default = "default_vba_bonus")]
    pub vba_bonus: u32,

    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: u32,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: u32,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: u32,

    /// Cells retained in the triage list.
    #[serde(default = "default_high_risk_cell_limit")]
    pub high_risk_cell_limit: usize,
}

fn default_circular_points() -> u32 {
    10
}
fn default_circular_cap() -> u32 {
    30
}
fn default_inconsistency_critical_points() -> u32 {
    8
}
fn default_inconsistency_critical_cap() -> u32 {
    25
}
fn default_inconsistency_points() -> u32 {
    5
}
fn default_inconsistency_cap() -> u32 {
    15
}
fn default_override_points() -> u32 {
    6
}
fn default_override_cap() -> u32 {
    20
}
fn default_very_hidden_points() -> u32 {
    15
}
fn default_hidden_sheet_points() -> u32 {
    5
}
fn default_hidden_rows_min() -> usize {
    5
}
fn default_hidden_rows_cap() -> u32 {
    10
}
fn default_error_points() -> u32 {
    2
}
fn default_error_cap() -> u32 {
    10
}
fn default_volatile_bonus() -> u32 {
    5
}
fn default_vba_bonus() -> u32 {
    10
}
fn default_critical_threshold() -> u32 {
    60
}
fn default_high_threshold() -> u32 {
    40
}
fn default_medium_threshold() -> u32 {
    20
}
fn default_high_risk_cell_limit() -> usize {
    20
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            circular_points: default_circular_points(),
            circular_cap: default_circular_cap(),
            inconsistency_critical_points: default_inconsistency_critical_points(),
            inconsistency_critical_cap: default_inconsistency_critical_cap(),
            inconsistency_points: default_inconsistency_points(),
            inconsistency_cap: default_inconsistency_cap(),
            override_points: default_override_points(),
            override_cap: default_override_cap(),
            very_hidden_points: default_very_hidden_points(),
            hidden_sheet_points: default_hidden_sheet_points(),
            hidden_rows_min: default_hidden_rows_min(),
            hidden_rows_cap: default_hidden_rows_cap(),
            error_points: default_error_points(),
            error_cap: default_error_cap(),
            volatile_bonus: default_volatile_bonus(),
            vba_bonus: default_vba_bonus(),
            critical_threshold: default_critical_threshold(),
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
            high_risk_cell_limit: default_high_risk_cell_limit(),
        }
    }
}

/// Function classification tables used by the inventory stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionTables {
    /// Spreadsheet error values to detect in cell results.
    #[serde(default = "default_excel_errors")]
    pub excel_errors: BTreeSet<String>,

    /// Functions that recalculate on every workbook change.
    #[serde(default = "default_volatile_functions")]
    pub volatile_functions: BTreeSet<String>,

    /// Category name to member function names.
    #[serde(default = "default_function_categories")]
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

fn string_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_excel_errors() -> BTreeSet<String> {
    string_set(&[
        "#REF!",
        "#DIV/0!",
        "#VALUE!",
        "#N/A",
        "#NAME?",
        "#NULL!",
        "#NUM!",
        "#GETTING_DATA",
    ])
}

fn default_volatile_functions() -> BTreeSet<String> {
    string_set(&[
        "NOW",
        "TODAY",
        "RAND",
        "RANDBETWEEN",
        "INDIRECT",
        "OFFSET",
        "INFO",
        "CELL",
    ])
}

fn default_function_categories() -> BTreeMap<String, BTreeSet<String>> {
    let mut categories = BTreeMap::new();
    categories.insert(
        "lookup".to_string(),
        string_set(&[
            "VLOOKUP", "HLOOKUP", "INDEX", "MATCH", "XLOOKUP", "LOOKUP", "CHOOSE",
        ]),
    );
    categories.insert(
        "financial".to_string(),
        string_set(&[
            "NPV", "IRR", "XIRR", "XNPV", "PMT", "FV", "PV", "RATE", "NPER", "SLN", "DB", "DDB",
        ]),
    );
    categories.insert(
        "statistical".to_string(),
        string_set(&[
            "AVERAGE", "STDEV", "VAR", "MEDIAN", "MODE", "CORREL", "FORECAST", "TREND", "GROWTH",
        ]),
    );
    categories.insert(
        "logical".to_string(),
        string_set(&["IF", "IFS", "AND", "OR", "NOT", "SWITCH", "IFERROR", "IFNA"]),
    );
    categories.insert(
        "aggregation".to_string(),
        string_set(&[
            "SUM",
            "SUMIF",
            "SUMIFS",
            "COUNT",
            "COUNTIF",
            "COUNTIFS",
            "SUMPRODUCT",
            "AGGREGATE",
        ]),
    );
    categories.insert(
        "text".to_string(),
        string_set(&[
            "CONCATENATE",
            "CONCAT",
            "LEFT",
            "RIGHT",
            "MID",
            "LEN",
            "TRIM",
            "SUBSTITUTE",
            "TEXT",
        ]),
    );
    categories.insert(
        "date".to_string(),
        string_set(&[
            "DATE",
            "YEAR",
            "MONTH",
            "DAY",
            "EOMONTH",
            "EDATE",
            "NETWORKDAYS",
            "WORKDAY",
        ]),
    );
    categories
}

impl Default for FunctionTables {
    fn default() -> Self {
        Self {
            excel_errors: default_excel_errors(),
            volatile_functions: default_volatile_functions(),
            categories: default_function_categories(),
        }
    }
}

impl FunctionTables {
    pub fn is_volatile(&self, function: &str) -> bool {
        self.volatile_functions.contains(function)
    }

    pub fn is_error_value(&self, value: &str) -> bool {
        self.excel_errors.contains(value)
    }

    /// First category containing the function, if any.
    pub fn category_of(&self, function: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, members)| members.contains(function))
            .map(|(name, _)| name.as_str())
    }
}

/// Complete audit configuration passed into the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub thresholds: AnalysisThresholds,
    #[serde(default)]
    pub scoring: ScoringRules,
    #[serde(default)]
    pub functions: FunctionTables,
}

pub const CONFIG_FILE_NAME: &str = ".sheetaudit.toml";

impl AuditConfig {
    /// Parse a configuration from TOML text; missing fields use defaults.
    pub fn from_toml(contents: &str) -> AuditResult<Self> {
        let config: AuditConfig = toml::from_str(contents)
            .map_err(|e| AuditError::Config(format!("failed to parse {CONFIG_FILE_NAME}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Walk from `start` upward looking for a config file; defaults when
    /// none is found.
    pub fn discover(start: &Path) -> AuditResult<Self> {
        let start = if start.is_file() {
            start.parent().unwrap_or(Path::new("."))
        } else {
            start
        };
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                log::debug!("loading config from {}", candidate.display());
                let contents = fs::read_to_string(&candidate)?;
                return Self::from_toml(&contents);
            }
        }
        Ok(Self::default())
    }

    fn validate(&self) -> AuditResult<()> {
        if !(0.0..=1.0).contains(&self.thresholds.dominance_ratio) {
            return Err(AuditError::Config(
                "dominance_ratio must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.thresholds.formula_fraction) {
            return Err(AuditError::Config(
                "formula_fraction must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.scoring.medium_threshold > self.scoring.high_threshold
            || self.scoring.high_threshold > self.scoring.critical_threshold
        {
            return Err(AuditError::Config(
                "risk level thresholds must be ordered medium <= high <= critical".to_string(),
            ));
        }
        Ok(())
    }
}
