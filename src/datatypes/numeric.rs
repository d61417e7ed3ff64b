//! Format-driven numeric parsing: the "standardise, then regex-validate"
//! path used when a column has no `format.pattern`, and the LDML
//! (Locale Data Markup Language) number-pattern parser used when it does
//! (spec §4.1).
//!
//! Grounded on the teacher's decimal handling in `schema.rs`
//! (`DecimalSpec`, `parse_decimal_literal`) — this module generalises that
//! single fixed-precision decimal path into the full CSV-W numeric family
//! (decimal/integer-ish/float) plus pattern-aware parsing.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Decimal,
    Integer,
    FloatOrDouble,
}

fn decimal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\+|-)?([0-9]+(\.[0-9]*)?|\.[0-9]+)$").unwrap())
}

fn integer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\-+]?[0-9]+$").unwrap())
}

fn float_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((\+|-)?([0-9]+(\.[0-9]*)?|\.[0-9]+)([Ee](\+|-)?[0-9]+)?|(\+|-)?INF|NaN)$")
            .unwrap()
    })
}

pub fn regex_for(kind: NumericKind) -> &'static Regex {
    match kind {
        NumericKind::Decimal => decimal_regex(),
        NumericKind::Integer => integer_regex(),
        NumericKind::FloatOrDouble => float_regex(),
    }
}

/// Standardises an unformatted numeric literal (spec §4.1): strip a
/// trailing `%`/`‰`, remove group-character occurrences between digits,
/// and replace the decimal character (between digits) with `.`.
pub fn standardise(raw: &str, group_char: char, decimal_char: char) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_suffix('%')
        .or_else(|| trimmed.strip_suffix('\u{2030}'))
        .unwrap_or(trimmed);

    let chars: Vec<char> = stripped.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (idx, &ch) in chars.iter().enumerate() {
        if ch == group_char {
            let prev_digit = idx > 0 && chars[idx - 1].is_ascii_digit();
            let next_digit = idx + 1 < chars.len() && chars[idx + 1].is_ascii_digit();
            if prev_digit && next_digit {
                continue; // drop group separator between digits
            }
            out.push(ch);
        } else if ch == decimal_char && decimal_char != '.' {
            let prev_digit = idx > 0 && chars[idx - 1].is_ascii_digit();
            let next_digit = idx + 1 < chars.len() && chars[idx + 1].is_ascii_digit();
            if prev_digit && next_digit {
                out.push('.');
            } else {
                out.push(ch);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Validates (and implicitly parses, for the decimal/integer cases) an
/// unformatted numeric literal against its datatype's regex (spec §4.1).
pub fn validate_standardised(kind: NumericKind, standardised: &str) -> bool {
    regex_for(kind).is_match(standardised)
}

/// A compiled LDML number pattern: prefix/suffix literals, grouping size,
/// minimum/maximum fraction digits, and whether a sign placeholder is
/// present (spec §4.1 "LDML number parser").
#[derive(Debug, Clone)]
pub struct LdmlPattern {
    prefix: String,
    suffix: String,
    grouping_size: Option<usize>,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
    has_sign_placeholder: bool,
}

impl LdmlPattern {
    pub fn parse(pattern: &str) -> Result<Self, ParseError> {
        let (literal_prefix, core, literal_suffix) = split_literal_segments(pattern)?;

        let mut has_sign_placeholder = false;
        let mut grouping_positions = Vec::new();
        let mut integer_digits = 0usize;
        let mut fraction_digits_total = 0usize;
        let mut fraction_zero_digits = 0usize;
        let mut seen_decimal_point = false;
        let mut position_from_decimal = 0usize;

        for ch in core.chars() {
            match ch {
                '0' | '#' => {
                    if seen_decimal_point {
                        fraction_digits_total += 1;
                        if ch == '0' {
                            fraction_zero_digits += 1;
                        }
                    } else {
                        integer_digits += 1;
                    }
                }
                ',' => {
                    if !seen_decimal_point {
                        grouping_positions.push(integer_digits);
                    }
                }
                '.' => {
                    seen_decimal_point = true;
                    position_from_decimal = 0;
                }
                '+' | '-' => {
                    has_sign_placeholder = true;
                }
                other => {
                    return Err(ParseError::new(format!(
                        "unsupported character '{other}' in LDML pattern '{pattern}'"
                    )));
                }
            }
            let _ = position_from_decimal;
        }

        let grouping_size = grouping_positions
            .windows(2)
            .last()
            .map(|w| w[1].saturating_sub(w[0]))
            .or_else(|| {
                if grouping_positions.len() == 1 {
                    Some(integer_digits.saturating_sub(grouping_positions[0]))
                } else {
                    None
                }
            });

        Ok(Self {
            prefix: literal_prefix,
            suffix: literal_suffix,
            grouping_size,
            min_fraction_digits: fraction_zero_digits,
            max_fraction_digits: fraction_digits_total,
            has_sign_placeholder,
        })
    }

    pub fn min_fraction_digits(&self) -> usize {
        self.min_fraction_digits
    }

    pub fn max_fraction_digits(&self) -> usize {
        self.max_fraction_digits
    }

    /// Parses `raw` against this pattern, returning an arbitrary-precision
    /// decimal. Deterministic and pure; failure carries a human-readable
    /// message (spec §4.1).
    pub fn parse_value(
        &self,
        raw: &str,
        group_char: char,
        decimal_char: char,
    ) -> Result<Decimal, ParseError> {
        let mut body = raw.trim();

        let mut negative = false;
        if let Some(rest) = body.strip_prefix(&self.prefix) {
            body = rest;
        } else if self.has_sign_placeholder
            && let Some(rest) = body.strip_prefix('-')
        {
            negative = true;
            body = rest;
        } else {
            return Err(ParseError::new(format!(
                "'{raw}' does not start with expected prefix '{}'",
                self.prefix
            )));
        }

        if let Some(rest) = body.strip_suffix(&self.suffix) {
            body = rest;
        } else {
            return Err(ParseError::new(format!(
                "'{raw}' does not end with expected suffix '{}'",
                self.suffix
            )));
        }

        if let Some(rest) = body.strip_prefix('+') {
            body = rest;
        } else if let Some(rest) = body.strip_prefix('-') {
            negative = true;
            body = rest;
        }

        let cleaned = standardise(body, group_char, decimal_char);
        if !validate_standardised(NumericKind::Decimal, &cleaned) {
            return Err(ParseError::new(format!(
                "'{raw}' does not match the numeric pattern after removing group/decimal markers"
            )));
        }

        let signed = if negative && !cleaned.starts_with('-') {
            format!("-{cleaned}")
        } else {
            cleaned
        };

        Decimal::from_str(&signed)
            .map_err(|err| ParseError::new(format!("'{raw}' is not a valid decimal: {err}")))
    }
}

/// Splits a pattern into `(literal_prefix, numeric_core, literal_suffix)`,
/// unquoting `'...'` literal runs.
fn split_literal_segments(pattern: &str) -> Result<(String, String, String), ParseError> {
    let is_core_char = |c: char| matches!(c, '0' | '#' | '.' | ',' | '+' | '-' | 'E' | 'e');

    let chars: Vec<char> = pattern.chars().collect();
    let mut idx = 0;
    let mut prefix = String::new();
    while idx < chars.len() && !is_core_char(chars[idx]) {
        if chars[idx] == '\'' {
            idx += 1;
            while idx < chars.len() && chars[idx] != '\'' {
                prefix.push(chars[idx]);
                idx += 1;
            }
            idx += 1; // closing quote
        } else {
            prefix.push(chars[idx]);
            idx += 1;
        }
    }

    let core_start = idx;
    let mut core_end = chars.len();
    while core_end > core_start && !is_core_char(chars[core_end - 1]) {
        core_end -= 1;
    }
    let core: String = chars[core_start..core_end].iter().collect();

    let mut suffix = String::new();
    let mut sidx = core_end;
    while sidx < chars.len() {
        if chars[sidx] == '\'' {
            sidx += 1;
            while sidx < chars.len() && chars[sidx] != '\'' {
                suffix.push(chars[sidx]);
                sidx += 1;
            }
            sidx += 1;
        } else {
            suffix.push(chars[sidx]);
            sidx += 1;
        }
    }

    if core.is_empty() {
        return Err(ParseError::new(format!(
            "LDML pattern '{pattern}' has no numeric placeholders"
        )));
    }

    Ok((prefix, core, suffix))
}
