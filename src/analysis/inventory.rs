//! Formula inventory: per-cell extraction plus workbook-level rollups.
//!
//! This is the single pass over every populated cell; the column analyses
//! and the dependency graph reuse the same parsed model but run
//! independently of the rollups built here.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::AuditConfig;
use crate::core::{
    CellRef, CellValue, ComplexityMetrics, ErrorCell, FormulaInfo, IssueKind, Severity,
    StructuralIssue, VolatileUse, Workbook,
};
use crate::formula::{functions_in, nesting_depth, normalize_pattern, references_in};

/// Everything the single inventory pass produces.
#[derive(Debug, Default)]
pub struct Inventory {
    pub formulas: Vec<FormulaInfo>,
    pub function_usage: BTreeMap<String, usize>,
    pub function_categories: BTreeMap<String, usize>,
    pub volatile_functions: Vec<VolatileUse>,
    pub errors_found: Vec<ErrorCell>,
    pub issues: Vec<StructuralIssue>,
    pub external_links: Vec<String>,
    pub complexity_metrics: ComplexityMetrics,
    pub inferred_purpose: String,
}

pub fn build_inventory(workbook: &Workbook, config: &AuditConfig) -> Inventory {
    let thresholds = &config.thresholds;
    let tables = &config.functions;

    let mut inventory = Inventory::default();
    let mut patterns: HashSet<String> = HashSet::new();
    let mut external: BTreeSet<String> = BTreeSet::new();

    for sheet in &workbook.sheets {
        for cell in &sheet.cells {
            let address = CellRef::new(sheet.name.clone(), &cell.col, cell.row).to_string();
            match &cell.value {
                CellValue::Formula(formula) => {
                    let functions = functions_in(formula);
                    let mut references = references_in(formula);
                    references.truncate(thresholds.max_references);
                    let depth = nesting_depth(formula);
                    let length = formula.chars().count();

                    for function in &functions {
                        *inventory.function_usage.entry(function.clone()).or_default() += 1;
                    }

                    let volatile: Vec<String> = functions
                        .iter()
                        .filter(|f| tables.is_volatile(f))
                        .cloned()
                        .collect();
                    if !volatile.is_empty() {
                        inventory.volatile_functions.push(VolatileUse {
                            cell: address.clone(),
                            volatile_functions: volatile,
                        });
                    }

                    if depth > thresholds.high_nesting_depth {
                        inventory.issues.push(StructuralIssue {
                            kind: IssueKind::HighNesting,
                            severity: Severity::Low,
                            cell: address.clone(),
                            detail: format!("Nesting depth: {depth}"),
                        });
                    }
                    if length > thresholds.long_formula_length {
                        inventory.issues.push(StructuralIssue {
                            kind: IssueKind::LongFormula,
                            severity: Severity::Info,
                            cell: address.clone(),
                            detail: format!("Formula length: {length} chars"),
                        });
                    }

                    if let Some(target) = external_link_target(formula) {
                        external.insert(target);
                    }

                    patterns.insert(normalize_pattern(formula));

                    inventory.formulas.push(FormulaInfo {
                        cell: address,
                        formula: truncate_chars(formula, thresholds.formula_truncate_len),
                        length,
                        functions,
                        references,
                        nesting_depth: depth,
                    });
                }
                CellValue::Error(error) if tables.is_error_value(error) => {
                    inventory.errors_found.push(ErrorCell {
                        cell: address,
                        error: error.clone(),
                        severity: Severity::Critical,
                    });
                }
                _ => {}
            }
        }
    }

    inventory.external_links = external
        .into_iter()
        .take(thresholds.external_link_cap)
        .collect();

    inventory.function_categories = categorize_usage(&inventory.function_usage, config);
    inventory.inferred_purpose = infer_purpose(&inventory.function_categories);
    inventory.complexity_metrics = complexity_rollup(&inventory, patterns.len());
    inventory
}

/// The `[workbook]` token inside a formula names an external workbook.
fn external_link_target(formula: &str) -> Option<String> {
    let start = formula.find('[')?;
    let end = formula.find(']')?;
    if start < end {
        Some(formula[start + 1..end].to_string())
    } else {
        None
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn categorize_usage(
    usage: &BTreeMap<String, usize>,
    config: &AuditConfig,
) -> BTreeMap<String, usize> {
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for (function, count) in usage {
        if let Some(category) = config.functions.category_of(function) {
            *categories.entry(category.to_string()).or_default() += count;
        }
    }
    categories
}

/// Coarse guess at what the workbook is for, from its function mix.
fn infer_purpose(categories: &BTreeMap<String, usize>) -> String {
    let count = |name: &str| categories.get(name).copied().unwrap_or(0);
    if count("financial") > 5 {
        "Financial model".to_string()
    } else if count("lookup") > count("aggregation") {
        "Data lookup/reference system".to_string()
    } else if count("aggregation") > 10 {
        "Reporting/aggregation tool".to_string()
    } else if count("date") > 5 {
        "Scheduling/timeline tracker".to_string()
    } else {
        "General purpose spreadsheet".to_string()
    }
}

fn complexity_rollup(inventory: &Inventory, unique_patterns: usize) -> ComplexityMetrics {
    let depths: Vec<u32> = inventory.formulas.iter().map(|f| f.nesting_depth).collect();
    let lengths: Vec<usize> = inventory.formulas.iter().map(|f| f.length).collect();
    ComplexityMetrics {
        total_formulas: inventory.formulas.len(),
        total_errors: inventory.errors_found.len(),
        volatile_function_count: inventory.volatile_functions.len(),
        avg_nesting_depth: round2(mean(depths.iter().map(|&d| d as f64))),
        max_nesting_depth: depths.iter().copied().max().unwrap_or(0),
        avg_formula_length: round1(mean(lengths.iter().map(|&l| l as f64))),
        max_formula_length: lengths.iter().copied().max().unwrap_or(0),
        unique_patterns,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Cell, Sheet};
    use pretty_assertions::assert_eq;

    fn workbook_with(cells: Vec<Cell>) -> Workbook {
        let mut sheet = Sheet::new("Sheet1");
        sheet.cells = cells;
        let mut workbook = Workbook::new("test.xlsx");
        workbook.sheets.push(sheet);
        workbook
    }

    fn formula(col: &str, row: u32, text: &str) -> Cell {
        Cell {
            col: col.to_string(),
            row,
            value: CellValue::Formula(text.to_string()),
        }
    }

    #[test]
    fn inventory_collects_usage_and_volatile_cells() {
        let workbook = workbook_with(vec![
            formula("A", 1, "=SUM(B1:B5)+NOW()"),
            formula("A", 2, "=SUM(C1:C5)"),
        ]);
        let inventory = build_inventory(&workbook, &AuditConfig::default());

        assert_eq!(inventory.function_usage.get("SUM"), Some(&2));
        assert_eq!(inventory.function_usage.get("NOW"), Some(&1));
        assert_eq!(inventory.volatile_functions.len(), 1);
        assert_eq!(inventory.volatile_functions[0].cell, "Sheet1!A1");
        assert_eq!(
            inventory.volatile_functions[0].volatile_functions,
            vec!["NOW"]
        );
    }

    #[test]
    fn error_values_are_collected() {
        let workbook = workbook_with(vec![Cell {
            col: "B".to_string(),
            row: 3,
            value: CellValue::Error("#DIV/0!".to_string()),
        }]);
        let inventory = build_inventory(&workbook, &AuditConfig::default());
        assert_eq!(inventory.errors_found.len(), 1);
        assert_eq!(inventory.errors_found[0].cell, "Sheet1!B3");
        assert_eq!(inventory.errors_found[0].error, "#DIV/0!");
    }

    #[test]
    fn deep_and_long_formulas_are_flagged() {
        let deep = "=IF(IF(IF(IF(A1,1,2),1,2),1,2),1,2)";
        let long = format!("=SUM(A1:A5)+{}", "B1+".repeat(80));
        let workbook = workbook_with(vec![formula("A", 1, deep), formula("A", 2, &long)]);
        let inventory = build_inventory(&workbook, &AuditConfig::default());

        let kinds: Vec<IssueKind> = inventory.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::HighNesting));
        assert!(kinds.contains(&IssueKind::LongFormula));
    }

    #[test]
    fn external_links_are_deduplicated() {
        let workbook = workbook_with(vec![
            formula("A", 1, "=[Budget.xlsx]Sheet1!A1"),
            formula("A", 2, "=[Budget.xlsx]Sheet1!A2"),
        ]);
        let inventory = build_inventory(&workbook, &AuditConfig::default());
        assert_eq!(inventory.external_links, vec!["Budget.xlsx"]);
    }

    #[test]
    fn purpose_inference_prefers_financial() {
        let mut categories = BTreeMap::new();
        categories.insert("financial".to_string(), 6);
        categories.insert("lookup".to_string(), 20);
        assert_eq!(infer_purpose(&categories), "Financial model");

        let mut categories = BTreeMap::new();
        categories.insert("lookup".to_string(), 3);
        assert_eq!(infer_purpose(&categories), "Data lookup/reference system");

        assert_eq!(
            infer_purpose(&BTreeMap::new()),
            "General purpose spreadsheet"
        );
    }

    #[test]
    fn complexity_metrics_summarize_the_inventory() {
        let workbook = workbook_with(vec![
            formula("A", 1, "=SUM(B1:B5)"),
            formula("A", 2, "=IF(SUM(C1:C5)>0,1,0)"),
        ]);
        let inventory = build_inventory(&workbook, &AuditConfig::default());
        let metrics = &inventory.complexity_metrics;
        assert_eq!(metrics.total_formulas, 2);
        assert_eq!(metrics.max_nesting_depth, 2);
        assert_eq!(metrics.avg_nesting_depth, 1.5);
        assert_eq!(metrics.unique_patterns, 2);
    }
}
