use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

use crate::availability::DateInterval;
use crate::error::{CalendarError, Result};

/// Literal separator between the two dates of a range cell.
pub const RANGE_SEPARATOR: &str = " - ";

/// Day, abbreviated month, four-digit year: `1 Jan 2025`.
pub const DEFAULT_PATTERN: &str = "%-d %b %Y";

/// A strftime pattern used both to read and to print calendar dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Returns `None` if chrono cannot make sense of the pattern.
    pub fn new(pattern: &str) -> Option<Self> {
        if pattern.trim().is_empty() {
            return None;
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return None;
        }
        Some(DateFormat {
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat {
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

/// Strict: the text must print back unchanged, so `"1 Jun 25"` or `"01 Jun 2025"` are rejected.
pub fn parse_date(text: &str, format: &DateFormat) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(text, format.pattern())
        .map_err(|e| CalendarError::malformed(text, format!("expected {:?}: {}", format.pattern(), e)))?;
    if format_date(date, format) != text {
        return Err(CalendarError::malformed(
            text,
            format!("does not match {:?} exactly", format.pattern()),
        ));
    }
    Ok(date)
}

/// Parse `"<start> - <end>"` into an interval. No fallback formats are tried.
pub fn parse_range(text: &str, format: &DateFormat) -> Result<DateInterval> {
    let parts: Vec<&str> = text.split(RANGE_SEPARATOR).collect();
    let [start, end] = parts.as_slice() else {
        return Err(CalendarError::malformed(
            text,
            format!("expected exactly one {:?} separator", RANGE_SEPARATOR),
        ));
    };

    let start = parse_date(start, format).map_err(|e| rewrap(text, e))?;
    let end = parse_date(end, format).map_err(|e| rewrap(text, e))?;

    DateInterval::new(start, end)
        .ok_or_else(|| CalendarError::malformed(text, "range ends before it starts"))
}

pub fn format_date(date: NaiveDate, format: &DateFormat) -> String {
    date.format(format.pattern()).to_string()
}

/// Render as `"<start> - <end>"`, the same shape [`parse_range`] accepts.
pub fn format_range(interval: &DateInterval, format: &DateFormat) -> String {
    format!(
        "{}{}{}",
        format_date(interval.start, format),
        RANGE_SEPARATOR,
        format_date(interval.end, format)
    )
}

// Report the whole cell rather than just the half that failed.
fn rewrap(text: &str, err: CalendarError) -> CalendarError {
    match err {
        CalendarError::MalformedDateRange { text: part, reason } => {
            CalendarError::malformed(text, format!("{:?}: {}", part, reason))
        }
        other => other,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_single_dates() {
        let f = DateFormat::default();
        assert_eq!(parse_date("1 Jan 2025", &f).unwrap(), d(2025, 1, 1));
        assert_eq!(parse_date("14 Jun 2025", &f).unwrap(), d(2025, 6, 14));
        assert_eq!(parse_date("31 Dec 2025", &f).unwrap(), d(2025, 12, 31));
    }

    #[test]
    fn parses_range() {
        let f = DateFormat::default();
        let r = parse_range("1 Jun 2025 - 14 Jun 2025", &f).unwrap();
        assert_eq!(r.start, d(2025, 6, 1));
        assert_eq!(r.end, d(2025, 6, 14));
    }

    #[test]
    fn reformat_gives_back_the_cell() {
        let f = DateFormat::default();
        for text in [
            "1 Jan 2025 - 31 Dec 2025",
            "28 Apr 2025 - 2 May 2025",
            "29 Feb 2024 - 3 Mar 2024",
            "10 Oct 2025 - 10 Oct 2025",
        ] {
            let r = parse_range(text, &f).unwrap();
            assert_eq!(format_range(&r, &f), text);
        }
    }

    #[test]
    fn parsing_is_repeatable() {
        let f = DateFormat::default();
        let a = parse_range("3 Mar 2025 - 7 Mar 2025", &f).unwrap();
        let b = parse_range("3 Mar 2025 - 7 Mar 2025", &f).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_separator_is_malformed() {
        let f = DateFormat::default();
        let err = parse_range("1 Jun 2025 to 14 Jun 2025", &f).unwrap_err();
        assert!(matches!(err, CalendarError::MalformedDateRange { .. }));

        // Hyphen without the surrounding spaces does not count.
        let err = parse_range("1 Jun 2025-14 Jun 2025", &f).unwrap_err();
        assert!(matches!(err, CalendarError::MalformedDateRange { .. }));
    }

    #[test]
    fn single_date_is_malformed() {
        let f = DateFormat::default();
        assert!(parse_range("1 Jun 2025", &f).is_err());
    }

    #[test]
    fn extra_separator_is_malformed() {
        let f = DateFormat::default();
        assert!(parse_range("1 Jun 2025 - 2 Jun 2025 - 3 Jun 2025", &f).is_err());
    }

    #[test]
    fn other_formats_are_not_guessed() {
        let f = DateFormat::default();
        assert!(parse_range("2025-06-01 - 2025-06-14", &f).is_err());
        assert!(parse_range("1 June 2025 - 14 June 2025", &f).is_err());
    }

    #[test]
    fn short_year_is_malformed() {
        let f = DateFormat::default();
        let err = parse_range("1 Jun 25 - 14 Jun 25", &f).unwrap_err();
        assert!(matches!(err, CalendarError::MalformedDateRange { .. }));
        assert!(parse_date("1 Jun 25", &f).is_err());
    }

    #[test]
    fn padded_day_is_malformed() {
        let f = DateFormat::default();
        assert!(parse_date("01 Jan 2025", &f).is_err());
        assert!(parse_range("01 Jun 2025 - 14 Jun 2025", &f).is_err());
    }

    #[test]
    fn reversed_range_is_malformed() {
        let f = DateFormat::default();
        let err = parse_range("14 Jun 2025 - 1 Jun 2025", &f).unwrap_err();
        assert!(err.to_string().contains("ends before it starts"));
    }

    #[test]
    fn error_names_the_whole_cell() {
        let f = DateFormat::default();
        let err = parse_range("1 Jun 2025 - 40 Jun 2025", &f).unwrap_err();
        match err {
            CalendarError::MalformedDateRange { text, .. } => {
                assert_eq!(text, "1 Jun 2025 - 40 Jun 2025")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_format_is_honoured() {
        let f = DateFormat::new("%Y-%m-%d").unwrap();
        let r = parse_range("2025-06-01 - 2025-06-14", &f).unwrap();
        assert_eq!(r.start, d(2025, 6, 1));
        assert_eq!(format_range(&r, &f), "2025-06-01 - 2025-06-14");
        assert!(parse_range("1 Jun 2025 - 14 Jun 2025", &f).is_err());
    }

    #[test]
    fn rejects_broken_patterns() {
        assert!(DateFormat::new("").is_none());
        assert!(DateFormat::new("%Q").is_none());
        assert!(DateFormat::new("%d/%m/%Y").is_some());
    }
}
