use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Timestamp token as it appears in scheduler logs: `YYYYMMDD/HHMMSS.mmm`.
/// Exactly 8 digits, a slash, 6 digits, a dot, 3 digits. No other
/// separators are accepted.
pub static TIMESTAMP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}/\d{6}\.\d{3}").expect("constant regex pattern is valid"));

const TIMESTAMP_FORMAT: &str = "%Y%m%d/%H%M%S%.3f";

/// Parse a matched timestamp token to millisecond precision.
///
/// The token is digit-shaped by construction, but the digits can still be
/// out of range (month 13, second 61). Those parse failures are reported as
/// `None` so callers can skip the line and keep scanning.
pub fn parse_timestamp(token: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).ok()
}

/// Find the first timestamp token on a line and parse it.
pub fn find_timestamp(line: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_PATTERN
        .find(line)
        .and_then(|m| parse_timestamp(m.as_str()))
}

/// The time range a log covers: the first parseable timestamp scanning from
/// the top, and the first scanning from the bottom.
///
/// This is positional, not a global min/max. If lines are out of
/// chronological order the range reflects line position. Empty input yields
/// `(None, None)`.
pub fn extract_time_range(text: &str) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let first = text.lines().find_map(find_timestamp);
    let last = text.lines().rev().find_map(find_timestamp);
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parses_millisecond_token() {
        let ts = parse_timestamp("20240115/080000.250").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(ts.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn rejects_out_of_range_digits() {
        assert!(parse_timestamp("20241315/080000.000").is_none());
        assert!(parse_timestamp("20240115/250000.000").is_none());
    }

    #[test]
    fn rejects_other_separators() {
        assert!(TIMESTAMP_PATTERN.find("2024-01-15 08:00:00.000").is_none());
        assert!(TIMESTAMP_PATTERN.find("20240115-080000.000").is_none());
    }

    #[test]
    fn time_range_is_positional() {
        // Out-of-order lines: the range follows line position, not ordering.
        let text = "20240115/090000.000 later line\n\
                    no timestamp here\n\
                    20240115/080000.000 earlier line\n";
        let (first, last) = extract_time_range(text);
        assert_eq!(first, Some(dt(2024, 1, 15, 9, 0, 0)));
        assert_eq!(last, Some(dt(2024, 1, 15, 8, 0, 0)));
    }

    #[test]
    fn time_range_skips_malformed_tokens() {
        let text = "99999999/999999.999 malformed\n\
                    20240115/080000.000 good\n";
        let (first, last) = extract_time_range(text);
        assert_eq!(first, Some(dt(2024, 1, 15, 8, 0, 0)));
        assert_eq!(last, Some(dt(2024, 1, 15, 8, 0, 0)));
    }

    #[test]
    fn time_range_of_empty_input() {
        assert_eq!(extract_time_range(""), (None, None));
        assert_eq!(extract_time_range("no timestamps at all\n"), (None, None));
    }
}
