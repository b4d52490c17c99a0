//! Reference and function extraction from raw formula text.
//!
//! Function-name extraction and reference extraction are independent passes
//! over the same text; neither depends on the other's result. Double-quoted
//! string literals are blanked out before either pass so a function-like or
//! cell-like token inside a string is never extracted. Extraction never
//! fails: text the regexes cannot make sense of simply yields empty lists.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::CellRef;

/// Cell and range references, optionally sheet-qualified (`Sheet2!B3:B10`,
/// `'Q1 Data'!A1`) and optionally `$`-anchored.
static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:'[^']+'!|[A-Za-z_][A-Za-z0-9_]*!)?\$?[A-Za-z]+\$?\d+(?::\$?[A-Za-z]+\$?\d+)?")
        .unwrap()
});

/// Identifiers immediately followed by `(`, matched against upper-cased text.
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z][A-Z0-9_.]+)\s*\(").unwrap());

static STRING_LITERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*""#).unwrap());

/// Single reference endpoint: `$B$17`, `b17`.
static ENDPOINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$?([A-Za-z]+)\$?(\d+)$").unwrap());

/// Blank out double-quoted string literals, preserving overall length is not
/// required, only that their contents stop matching.
fn strip_string_literals(formula: &str) -> String {
    STRING_LITERAL_RE.replace_all(formula, "\"\"").into_owned()
}

/// All function names invoked by the formula, upper-cased, in order of
/// appearance, duplicates retained (usage counts depend on occurrences).
pub fn functions_in(formula: &str) -> Vec<String> {
    let stripped = strip_string_literals(formula).to_uppercase();
    FUNCTION_RE
        .captures_iter(&stripped)
        .map(|c| c[1].to_string())
        .collect()
}

/// All raw reference tokens in the formula, in order of appearance.
pub fn references_in(formula: &str) -> Vec<String> {
    let stripped = strip_string_literals(formula);
    REFERENCE_RE
        .find_iter(&stripped)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Maximum parenthesis nesting depth.
///
/// The running depth may go negative on malformed input (more closes than
/// opens); only the maximum is reported and it never drops below zero.
pub fn nesting_depth(formula: &str) -> u32 {
    let mut max_depth: i32 = 0;
    let mut current: i32 = 0;
    for ch in formula.chars() {
        match ch {
            '(' => {
                current += 1;
                max_depth = max_depth.max(current);
            }
            ')' => current -= 1,
            _ => {}
        }
    }
    max_depth.max(0) as u32
}

/// Resolve a raw reference token to a normalized cell identity.
///
/// References without an explicit sheet inherit `default_sheet`. A range
/// reference is reduced to its first endpoint only; ranges are deliberately
/// not expanded into per-cell identities, so a 10,000-row range contributes
/// one edge to the dependency graph rather than 10,000.
pub fn normalize_reference(raw: &str, default_sheet: &str) -> Option<CellRef> {
    let (sheet, rest) = match raw.split_once('!') {
        Some((qualifier, rest)) => (qualifier.trim_matches('\''), rest),
        None => (default_sheet, raw),
    };
    let endpoint = rest.split(':').next()?;
    let caps = ENDPOINT_RE.captures(endpoint)?;
    let row: u32 = caps[2].parse().ok()?;
    Some(CellRef::new(sheet, &caps[1], row))
}
