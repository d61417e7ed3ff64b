//! Validation output (spec §6): the `WarningsAndErrors` value and its
//! human-readable / JSON renderers.
//!
//! Grounded on `verify.rs`'s tiered reporting (`InvalidReportOptions`,
//! `print_invalid_report`) and `table.rs::render_table`, reused unchanged
//! for the human-readable mode. JSON mode is new: spec §6's
//! `WarningsAndErrors` shape already mirrors `ReportEntry`'s serde layout,
//! so it serializes directly via `serde_json`.

use serde::Serialize;

use crate::error::ReportEntry;
use crate::table;

/// The engine's top-level output value (spec §6).
#[derive(Debug, Default, Serialize)]
pub struct WarningsAndErrors {
    pub warnings: Vec<ReportEntry>,
    pub errors: Vec<ReportEntry>,
}

impl WarningsAndErrors {
    /// Exit-code rule (spec §6): warnings alone never fail a run.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_human(&self) -> String {
        let mut output = String::new();
        if !self.errors.is_empty() {
            output.push_str("Errors:\n");
            output.push_str(&render_entries(&self.errors));
        }
        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Warnings:\n");
            output.push_str(&render_entries(&self.warnings));
        }
        if output.is_empty() {
            output.push_str("No warnings or errors.\n");
        }
        output
    }
}

fn render_entries(entries: &[ReportEntry]) -> String {
    let headers = vec![
        "type".to_string(),
        "category".to_string(),
        "row".to_string(),
        "column".to_string(),
        "content".to_string(),
        "csv_path".to_string(),
    ];
    let rows = entries
        .iter()
        .map(|entry| {
            vec![
                entry.kind.clone(),
                entry.category.clone(),
                entry.row.clone(),
                entry.column.clone(),
                entry.content.clone(),
                entry.csv_path.clone().unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    table::render_table(&headers, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{categories, kinds};

    #[test]
    fn empty_report_is_valid_and_says_so() {
        let report = WarningsAndErrors::default();
        assert!(report.is_valid());
        assert!(report.render_human().contains("No warnings or errors"));
    }

    #[test]
    fn errors_make_the_report_invalid() {
        let mut report = WarningsAndErrors::default();
        report.errors.push(ReportEntry::new(
            kinds::DUPLICATE_KEY,
            categories::STRUCTURE,
            "2",
            "",
            "key already present - W1",
        ));
        assert!(!report.is_valid());
        assert!(report.render_human().contains("duplicate_key"));
    }

    #[test]
    fn json_round_trips_entry_fields() {
        let mut report = WarningsAndErrors::default();
        report.warnings.push(ReportEntry::new(
            kinds::BLANK_ROWS,
            categories::STRUCTURE,
            "4",
            "",
            "",
        ));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"type\": \"Blank rows\""));
        assert!(json.contains("\"row\": \"4\""));
    }
}
