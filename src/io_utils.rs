//! Encoding-aware CSV record decoding.
//!
//! CSV-W's `dialect.encoding` names a declared text encoding for a table's
//! bytes (spec §4.6); the pipeline reads rows as raw [`csv::ByteRecord`]s and
//! decodes each field through here so a table never silently gets treated as
//! UTF-8 when it isn't.

use anyhow::{Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

/// Resolves a dialect's `encoding` label to a concrete [`Encoding`], defaulting
/// to UTF-8 when the label is absent.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_label_defaults_to_utf8() {
        let encoding = resolve_encoding(None).unwrap();
        assert_eq!(encoding, UTF_8);
    }

    #[test]
    fn unknown_label_is_an_error() {
        assert!(resolve_encoding(Some("not-a-real-encoding")).is_err());
    }

    #[test]
    fn decode_record_decodes_each_field() {
        let record = csv::ByteRecord::from(vec!["a".as_bytes(), "b".as_bytes()]);
        let decoded = decode_record(&record, UTF_8).unwrap();
        assert_eq!(decoded, vec!["a".to_string(), "b".to_string()]);
    }
}
