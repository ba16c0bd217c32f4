//! Delimited-text rendering of result sets for model prompts.
//!
//! The header line holds the column names, then one line per row. Values are
//! joined with a bare comma and never quoted or escaped, so a cell containing
//! a comma or newline produces ambiguous output.

use crate::table::TabularResult;

const DELIMITER: &str = ",";
const LINE_SEPARATOR: &str = "\n";

/// Render a result set as comma-separated lines with no trailing newline.
///
/// A result without columns renders as the empty string.
pub fn to_delimited_text(result: &TabularResult) -> String {
    if result.columns().is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(result.rows().len() + 1);
    lines.push(result.columns().join(DELIMITER));
    for row in result.rows() {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        lines.push(cells.join(DELIMITER));
    }
    lines.join(LINE_SEPARATOR)
}
