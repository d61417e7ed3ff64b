//! CSV dialect configuration and reader construction (spec §3 Dialect,
//! §4.4 step 2).
//!
//! Grounded on `io_utils.rs::open_csv_reader`: the teacher resolves a
//! delimiter and builds a `csv::Reader` from a handful of flags. This module
//! generalises that to the CSV-W dialect object (quote/escape policy, row
//! skipping, blank-row skipping, encoding) and keeps field-level trimming
//! since CSV-W's `dialect.trim` is defined per-field, not per-record.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, UTF_8};

/// A table's CSV parser configuration (spec §3).
#[derive(Debug, Clone)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote_char: u8,
    pub double_quote: bool,
    pub skip_rows: usize,
    pub skip_blank_rows: bool,
    pub header: bool,
    pub encoding: &'static Encoding,
    pub trim: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote_char: b'"',
            double_quote: true,
            skip_rows: 0,
            skip_blank_rows: true,
            header: true,
            encoding: UTF_8,
            trim: false,
        }
    }
}

impl Dialect {
    /// Builds a `csv::Reader` from this dialect. The CSV crate's own
    /// `has_headers` machinery is disabled (`has_headers(false)`) so the
    /// engine always sees the header row as the first record and can run
    /// its own header-validation pass on it (spec §4.2).
    pub fn build_reader<R: Read>(&self, reader: R) -> csv::Reader<R> {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote_char)
            .has_headers(false)
            .flexible(true)
            .trim(if self.trim { Trim::Fields } else { Trim::None });

        if self.double_quote {
            builder.double_quote(true);
        } else {
            builder.double_quote(false).escape(Some(b'\\'));
        }

        builder.from_reader(reader)
    }

    /// Whether a decoded record counts as blank for `dialect.skip_blank_rows`
    /// (spec §4.4 step 3): every field empty after trimming.
    pub fn is_blank_record(&self, fields: &[String]) -> bool {
        fields.iter().all(|field| field.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dialect_matches_rfc4180_defaults() {
        let dialect = Dialect::default();
        assert_eq!(dialect.delimiter, b',');
        assert_eq!(dialect.quote_char, b'"');
        assert!(dialect.double_quote);
        assert_eq!(dialect.skip_rows, 0);
        assert!(dialect.skip_blank_rows);
        assert!(dialect.header);
        assert_eq!(dialect.encoding, UTF_8);
    }

    #[test]
    fn is_blank_record_detects_all_empty_fields() {
        let dialect = Dialect::default();
        assert!(dialect.is_blank_record(&["".to_string(), "  ".to_string()]));
        assert!(!dialect.is_blank_record(&["".to_string(), "x".to_string()]));
    }
}
