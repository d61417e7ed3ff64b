//! Regex-validated opaque duration strings (spec §4.1): `duration`,
//! `dayTimeDuration`, `yearMonthDuration`. These parse to their own raw
//! string (no numeric decomposition) once validated against the XSD
//! lexical grammar for each duration subtype.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationKind {
    Duration,
    DayTimeDuration,
    YearMonthDuration,
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^-?P(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?$",
        )
        .unwrap()
    })
}

fn day_time_duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?P(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?$").unwrap()
    })
}

fn year_month_duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?P(?:\d+Y)?(?:\d+M)?$").unwrap())
}

fn has_any_component(body: &str) -> bool {
    body.chars().any(|c| c.is_ascii_digit())
}

pub fn validate(kind: DurationKind, raw: &str) -> bool {
    let trimmed = raw.trim();
    let regex = match kind {
        DurationKind::Duration => duration_regex(),
        DurationKind::DayTimeDuration => day_time_duration_regex(),
        DurationKind::YearMonthDuration => year_month_duration_regex(),
    };
    regex.is_match(trimmed) && has_any_component(trimmed) && trimmed != "P" && trimmed != "-P"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_durations() {
        assert!(validate(DurationKind::Duration, "P1Y2M3DT4H5M6S"));
        assert!(validate(DurationKind::DayTimeDuration, "P3DT4H5M"));
        assert!(validate(DurationKind::YearMonthDuration, "P1Y6M"));
    }

    #[test]
    fn rejects_empty_or_malformed() {
        assert!(!validate(DurationKind::Duration, "P"));
        assert!(!validate(DurationKind::Duration, "1Y2M"));
        assert!(!validate(DurationKind::YearMonthDuration, "P3D"));
    }
}
