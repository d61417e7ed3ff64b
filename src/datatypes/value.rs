//! The parsed-value tagged sum (spec §9 "Dynamic parsed-value type") and the
//! zoned date/time representation used by the date-like datatypes.
//!
//! Two string forms are exposed per value: [`Value::display_string`] (the
//! value's own textual representation, zone-preserving for datetimes) used
//! when building human-readable error content, and [`Value::canonical_key`]
//! (decimal-normalised / UTC-instant-normalised) used for primary- and
//! foreign-key equality. Keeping these distinct is what lets `"1.0"` and
//! `"1.00"` collapse to one primary key (P8) while a `duplicate_key` message
//! still echoes the value as the row actually spelled it (see the
//! `multiple_matched_rows`-adjacent scenario in spec.md §8 S4).

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rust_decimal::Decimal;

/// A zoned date/time instant, retaining the original textual offset for
/// display alongside the UTC-normalised instant used for comparison.
#[derive(Debug, Clone)]
pub struct ZonedDateTime {
    raw: String,
    offset: FixedOffset,
    instant: DateTime<Utc>,
}

impl ZonedDateTime {
    pub fn new(raw: impl Into<String>, local: DateTime<FixedOffset>) -> Self {
        Self {
            raw: raw.into(),
            offset: *local.offset(),
            instant: local.with_timezone(&Utc),
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// UTC-normalised instant string, e.g. `2004-04-12T18:20:00Z`. Two
    /// [`ZonedDateTime`]s are equal for primary-key purposes iff this string
    /// matches (spec §4.1, P7).
    pub fn canonical_instant_string(&self) -> String {
        self.instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// The value's own textual form plus a redundant `[UTC<offset>]`
    /// annotation, matching the bracketed zoned-datetime display used in
    /// duplicate-key reporting (spec.md §8 S4).
    pub fn display_string(&self) -> String {
        format!("{}[UTC{}]", self.raw, self.offset)
    }
}

impl PartialEq for ZonedDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}
impl Eq for ZonedDateTime {}

/// A successfully parsed cell value (spec §9: `Bool | Int | Decimal | Float
/// | DateTime | Str`). Invalid items never reach this type: the column
/// validator only appends a value to its result list on successful parse
/// (spec §4.2 step 4), which is also our resolution of Open Question (a) —
/// invalid items are never carried into primary/foreign key tuples.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bool(bool),
    Int(i128),
    Decimal(Decimal),
    Float(f64),
    DateTime(ZonedDateTime),
}

impl Value {
    /// The value's own string representation — used for list-column
    /// concatenation (spec §4.3) and for error-message content.
    pub fn display_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::Float(f) => format_xsd_float(*f),
            Value::DateTime(zdt) => zdt.display_string(),
        }
    }

    /// The canonical form used for primary-/foreign-key equality: decimal
    /// values normalise trailing zeros (P8) and datetimes normalise to a
    /// UTC instant (P7); everything else is its plain string form.
    pub fn canonical_key(&self) -> String {
        match self {
            Value::Decimal(d) => d.normalize().to_string(),
            Value::DateTime(zdt) => zdt.canonical_instant_string(),
            other => other.display_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_string())
    }
}

/// Formats a float the way the XSD lexical space requires: `INF`, `-INF`,
/// `NaN` (case-sensitive), otherwise a plain decimal/exponential literal.
pub fn format_xsd_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decimal_canonical_key_normalises_trailing_zeros() {
        let a = Value::Decimal("1.0".parse().unwrap());
        let b = Value::Decimal("1.00".parse().unwrap());
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn zoned_datetime_same_instant_different_offset_are_equal() {
        let a = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2004, 4, 12, 20, 20, 0)
            .unwrap();
        let b = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2004, 4, 12, 18, 20, 0)
            .unwrap();
        let za = ZonedDateTime::new("2004-04-12T20:20:00+02:00", a);
        let zb = ZonedDateTime::new("2004-04-12T18:20:00Z", b);
        assert_eq!(
            Value::DateTime(za).canonical_key(),
            Value::DateTime(zb).canonical_key()
        );
    }

    #[test]
    fn display_string_preserves_original_offset_with_bracket() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2004, 4, 12, 20, 20, 0).unwrap();
        let zdt = ZonedDateTime::new("2004-04-12T20:20+02:00", local);
        assert_eq!(
            Value::DateTime(zdt).display_string(),
            "2004-04-12T20:20+02:00[UTC+02:00]"
        );
    }

    #[test]
    fn xsd_float_formatting() {
        assert_eq!(format_xsd_float(f64::NAN), "NaN");
        assert_eq!(format_xsd_float(f64::INFINITY), "INF");
        assert_eq!(format_xsd_float(f64::NEG_INFINITY), "-INF");
    }
}
