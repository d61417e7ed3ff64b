//! Column schema model and the column validator (spec §3 Column, §4.2
//! Column Validator).
//!
//! Grounded on the teacher's `schema.rs` (`ColumnMeta`'s length/range
//! restrictions and header matching) and `verify.rs`'s per-cell validation
//! loop, generalised from the teacher's fixed 10-type business schema to the
//! full CSV-W datatype/format/restriction model.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::datatypes::registry::{self, Datatype, ValueFormat};
use crate::datatypes::value::Value;
use crate::error::{ReportEntry, categories, kinds};

/// Length restrictions (spec §3 Column): `{length?, min_length?, max_length?}`.
#[derive(Debug, Clone, Default)]
pub struct LengthRestriction {
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// Numeric/date range restrictions, held as raw strings and parsed lazily
/// under the column's datatype on first use (spec §9 "Lazy restriction
/// parsing").
#[derive(Debug, Clone, Default)]
pub struct RangeRestriction {
    pub min_inclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub max_exclusive: Option<String>,
}

#[derive(Debug, Default)]
struct LazyBounds {
    min_inclusive: OnceLock<Option<Value>>,
    max_inclusive: OnceLock<Option<Value>>,
    min_exclusive: OnceLock<Option<Value>>,
    max_exclusive: OnceLock<Option<Value>>,
}

/// A single column's schema (spec §3 Column).
#[derive(Debug)]
pub struct Column {
    pub ordinal: usize,
    pub name: Option<String>,
    pub id: Option<String>,
    pub datatype: Datatype,
    pub datatype_uri: String,
    pub format: Option<ValueFormat>,
    pub null_tokens: Vec<String>,
    pub separator: Option<String>,
    pub required: bool,
    pub length: LengthRestriction,
    pub range: RangeRestriction,
    pub titles: HashMap<String, Vec<String>>,
    pub lang: String,
    pub about_url: Option<String>,
    pub property_url: Option<String>,
    pub value_url: Option<String>,
    pub text_direction: Option<String>,
    pub ordered: bool,
    pub is_virtual: bool,
    pub suppress_output: bool,
    bounds: LazyBounds,
}

impl Column {
    pub fn new(ordinal: usize, datatype: Datatype) -> Self {
        Self {
            ordinal,
            name: None,
            id: None,
            datatype_uri: datatype.uri(),
            datatype,
            format: None,
            null_tokens: vec![String::new()],
            separator: None,
            required: false,
            length: LengthRestriction::default(),
            range: RangeRestriction::default(),
            titles: HashMap::new(),
            lang: "und".to_string(),
            about_url: None,
            property_url: None,
            value_url: None,
            text_direction: None,
            ordered: false,
            is_virtual: false,
            suppress_output: false,
            bounds: LazyBounds::default(),
        }
    }

    fn format_or_default(&self) -> ValueFormat {
        self.format.clone().unwrap_or_else(ValueFormat::new)
    }

    fn bound(&self, cell: &OnceLock<Option<Value>>, raw: Option<&str>) -> Option<Value> {
        cell.get_or_init(|| {
            let raw = raw?;
            registry::parse(self.datatype, raw, &self.format_or_default()).ok()
        })
        .clone()
    }

    fn min_inclusive(&self) -> Option<Value> {
        self.bound(&self.bounds.min_inclusive, self.range.min_inclusive.as_deref())
    }
    fn max_inclusive(&self) -> Option<Value> {
        self.bound(&self.bounds.max_inclusive, self.range.max_inclusive.as_deref())
    }
    fn min_exclusive(&self) -> Option<Value> {
        self.bound(&self.bounds.min_exclusive, self.range.min_exclusive.as_deref())
    }
    fn max_exclusive(&self) -> Option<Value> {
        self.bound(&self.bounds.max_exclusive, self.range.max_exclusive.as_deref())
    }

    fn error(&self, kind: &str, row_number: usize, content: String) -> ReportEntry {
        ReportEntry::new(
            kind,
            categories::SCHEMA,
            row_number.to_string(),
            self.ordinal.to_string(),
            content,
        )
    }

    /// Validates one raw cell (spec §4.2 `validate(cell) -> (errors, values)`).
    pub fn validate(&self, cell: &str, row_number: usize) -> (Vec<ReportEntry>, Vec<Value>) {
        let mut errors = Vec::new();
        let mut values = Vec::new();

        if self.null_tokens.iter().any(|token| token == cell) {
            if self.required && cell.is_empty() {
                errors.push(self.error(
                    kinds::REQUIRED,
                    row_number,
                    format!("required => {}", self.required),
                ));
            }
            return (errors, values);
        }

        let items: Vec<&str> = match &self.separator {
            Some(sep) if !sep.is_empty() => cell.split(sep.as_str()).collect(),
            _ => vec![cell],
        };

        for item in items {
            self.validate_item(item, row_number, &mut errors, &mut values);
        }

        (errors, values)
    }

    fn validate_item(
        &self,
        item: &str,
        row_number: usize,
        errors: &mut Vec<ReportEntry>,
        values: &mut Vec<Value>,
    ) {
        let format = self.format_or_default();
        let mut item_failed = false;

        let parsed = match registry::parse(self.datatype, item, &format) {
            Ok(value) => Some(value),
            Err(err) => {
                let pattern_desc = format
                    .pattern
                    .as_deref()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "no format provided".to_string());
                errors.push(self.error(
                    &kinds::invalid_datatype(self.datatype.local_name()),
                    row_number,
                    format!("'{item}' - {err} ({pattern_desc})"),
                ));
                item_failed = true;
                None
            }
        };

        let length_of = |s: &str| -> usize {
            match self.datatype {
                Datatype::Base64Binary => {
                    let trimmed = s.trim_end_matches('=');
                    (trimmed.chars().count() * 3) / 4
                }
                Datatype::HexBinary => s.chars().count() / 2,
                _ => s.chars().count(),
            }
        };

        // Spec §4.2 step 3: length/range/required/format only run "on
        // success" of the datatype parse — an item that already failed
        // `registry::parse` emits only its `invalid_<datatype>` error.
        if let Some(parsed_value) = &parsed {
            let observed_len = length_of(item);
            if let Some(length) = self.length.length
                && observed_len != length
            {
                errors.push(self.error(
                    kinds::LENGTH,
                    row_number,
                    format!("expected length {length}, found {observed_len}"),
                ));
                item_failed = true;
            }
            if let Some(min_length) = self.length.min_length
                && observed_len < min_length
            {
                errors.push(self.error(
                    kinds::MIN_LENGTH,
                    row_number,
                    format!("expected at least {min_length}, found {observed_len}"),
                ));
                item_failed = true;
            }
            if let Some(max_length) = self.length.max_length
                && observed_len > max_length
            {
                errors.push(self.error(
                    kinds::MAX_LENGTH,
                    row_number,
                    format!("expected at most {max_length}, found {observed_len}"),
                ));
                item_failed = true;
            }

            if let Some(bound) = self.min_inclusive()
                && compare_values(parsed_value, &bound) == Some(Ordering::Less)
            {
                errors.push(self.error(
                    kinds::MIN_INCLUSIVE,
                    row_number,
                    format!("'{item}' is below the minimum {}", bound.display_string()),
                ));
                item_failed = true;
            }
            if let Some(bound) = self.max_inclusive()
                && compare_values(parsed_value, &bound) == Some(Ordering::Greater)
            {
                errors.push(self.error(
                    kinds::MAX_INCLUSIVE,
                    row_number,
                    format!("'{item}' is above the maximum {}", bound.display_string()),
                ));
                item_failed = true;
            }
            if let Some(bound) = self.min_exclusive()
                && compare_values(parsed_value, &bound) != Some(Ordering::Greater)
            {
                errors.push(self.error(
                    kinds::MIN_EXCLUSIVE,
                    row_number,
                    format!("'{item}' must be greater than {}", bound.display_string()),
                ));
                item_failed = true;
            }
            if let Some(bound) = self.max_exclusive()
                && compare_values(parsed_value, &bound) != Some(Ordering::Less)
            {
                errors.push(self.error(
                    kinds::MAX_EXCLUSIVE,
                    row_number,
                    format!("'{item}' must be less than {}", bound.display_string()),
                ));
                item_failed = true;
            }

            if self.required && item.is_empty() {
                errors.push(self.error(
                    kinds::REQUIRED,
                    row_number,
                    format!("required => {}", self.required),
                ));
                item_failed = true;
            }

            if let Some(pattern) = &format.pattern
                && self.datatype.is_string_like()
                && !registry::format_validate(self.datatype, item, pattern)
            {
                errors.push(self.error(
                    kinds::FORMAT,
                    row_number,
                    format!("'{item}' does not match format '{pattern}'"),
                ));
                item_failed = true;
            }
        }

        if !item_failed && let Some(value) = parsed {
            values.push(value);
        }
    }

    /// Header validation (spec §4.2): the observed header string must match
    /// one of the column's titles under a language tag that matches
    /// `column.lang`.
    pub fn validate_header(&self, observed: &str) -> Option<ReportEntry> {
        let matches = self.titles.iter().any(|(tag, titles)| {
            language_tags_match(tag, &self.lang) && titles.iter().any(|title| title == observed)
        });
        if matches || self.titles.is_empty() {
            None
        } else {
            Some(ReportEntry::new(
                kinds::INVALID_HEADER,
                categories::SCHEMA_UPPER,
                "1",
                self.ordinal.to_string(),
                observed.to_string(),
            ))
        }
    }
}

/// Language-tag matching (spec §4.2): equal, either is `und`, or one is a
/// hyphen-prefixed subtag of the other.
pub fn language_tags_match(a: &str, b: &str) -> bool {
    if a.eq_ignore_ascii_case(b) || a.eq_ignore_ascii_case("und") || b.eq_ignore_ascii_case("und") {
        return true;
    }
    let a_lower = a.to_ascii_lowercase();
    let b_lower = b.to_ascii_lowercase();
    a_lower.starts_with(&format!("{b_lower}-")) || b_lower.starts_with(&format!("{a_lower}-"))
}

/// Compares two parsed values of the same datatype family for range
/// restriction purposes (spec §4.2): numeric compares use parsed numeric
/// bounds, datetime compares use UTC instant ordering.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Decimal(x), Value::Decimal(y)) => x.partial_cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::DateTime(x), Value::DateTime(y)) => x.instant().partial_cmp(&y.instant()),
        (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn int_column() -> Column {
        let mut column = Column::new(1, Datatype::Integer);
        column.range.min_inclusive = Some("0".to_string());
        column.range.max_inclusive = Some("100".to_string());
        column
    }

    #[test]
    fn null_token_short_circuits_validation() {
        let column = Column::new(1, Datatype::Integer);
        let (errors, values) = column.validate("", 2);
        assert!(errors.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn required_on_empty_emits_error() {
        let mut column = Column::new(1, Datatype::String);
        column.required = true;
        column.null_tokens = vec!["N/A".to_string()];
        let (errors, values) = column.validate("", 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, kinds::REQUIRED);
        assert!(values.is_empty());
    }

    #[test]
    fn range_restrictions_enforced() {
        let column = int_column();
        let (errors, values) = column.validate("150", 5);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, kinds::MAX_INCLUSIVE);
        assert!(values.is_empty());

        let (errors, values) = column.validate("50", 5);
        assert!(errors.is_empty());
        assert_eq!(values, vec![Value::Int(50)]);
    }

    #[test]
    fn list_column_splits_on_separator() {
        let mut column = Column::new(1, Datatype::Integer);
        column.separator = Some(";".to_string());
        let (errors, values) = column.validate("1;2;3", 1);
        assert!(errors.is_empty());
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn invalid_item_is_not_appended_to_values() {
        let column = Column::new(1, Datatype::Integer);
        let (errors, values) = column.validate("abc", 3);
        assert_eq!(errors.len(), 1);
        assert!(values.is_empty());
    }

    #[test]
    fn language_tag_matching_rules() {
        assert!(language_tags_match("en", "en-GB"));
        assert!(language_tags_match("en-GB", "en"));
        assert!(language_tags_match("x", "und"));
        assert!(!language_tags_match("en", "fr"));
    }

    proptest! {
        #[test]
        fn range_restrictions_hold_for_any_integer(x in -1000i64..1000) {
            let column = int_column();
            let (errors, values) = column.validate(&x.to_string(), 1);
            if x < 0 {
                prop_assert_eq!(errors.len(), 1);
                prop_assert_eq!(errors[0].kind.as_str(), kinds::MIN_INCLUSIVE);
            } else if x > 100 {
                prop_assert_eq!(errors.len(), 1);
                prop_assert_eq!(errors[0].kind.as_str(), kinds::MAX_INCLUSIVE);
            } else {
                prop_assert!(errors.is_empty());
                prop_assert_eq!(&values, &[Value::Int(x as i128)]);
            }
        }

        #[test]
        fn list_column_yields_one_parse_attempt_per_separator_split(
            segments in proptest::collection::vec("[A-Za-z0-9]{1,5}", 1..8)
        ) {
            let mut column = Column::new(1, Datatype::String);
            column.separator = Some(";".to_string());
            let joined = segments.join(";");
            let (errors, values) = column.validate(&joined, 1);
            prop_assert!(errors.is_empty());
            prop_assert_eq!(errors.len() + values.len(), segments.len());
        }
    }

    #[test]
    fn header_mismatch_reports_invalid_header() {
        let mut column = Column::new(2, Datatype::String);
        column.titles.insert("en".to_string(), vec!["Age".to_string()]);
        assert!(column.validate_header("Age").is_none());
        let err = column.validate_header("").unwrap();
        assert_eq!(err.kind, kinds::INVALID_HEADER);
        assert_eq!(err.column, "2");
    }
}
