//! Structural formula signatures.
//!
//! A signature erases everything that legitimately varies down a column-wise
//! series (row numbers, numeric literals, string contents) while keeping
//! function names and column letters verbatim. Two formulas sharing a
//! signature are "the same pattern": `=B2*C2` and `=B3*C3` both normalize
//! to `=B{R}*C{R}`.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*""#).unwrap());

/// Letters directly followed by digits: a cell token like `B17` or `AA3`.
static CELL_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z]+)\d+").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Reduce a formula to its structural signature.
///
/// Replacement order matters for idempotence: `$` anchors are dropped first,
/// then quoted strings become `"{S}"`, then `COLUMN+ROW` tokens become
/// `COLUMN{R}`, and only the digits left over after that (never preceded by
/// a letter) become `{N}`. None of the placeholders contain digits, so
/// normalizing an already-normalized signature is a no-op.
pub fn normalize_pattern(formula: &str) -> String {
    let no_anchors = formula.replace('$', "");
    let no_strings = QUOTED_STRING_RE.replace_all(&no_anchors, "\"{S}\"");
    let no_rows = CELL_TOKEN_RE.replace_all(&no_strings, "${1}{R}");
    NUMBER_RE.replace_all(&no_rows, "{N}").into_owned()
}
