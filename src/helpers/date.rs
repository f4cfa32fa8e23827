//! Date helper functions

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Text shown when a publish date is missing or unparseable
pub const INVALID_DATE: &str = "Invalid Date";

/// Format a date using a Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "M/D/YYYY") // -> "1/15/2024"
/// ```
pub fn format_date<Z: TimeZone>(date: &DateTime<Z>, format: &str) -> String
where
    Z::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Parse a stored timestamp into the display timezone.
///
/// Accepts RFC 3339 timestamps, offset-less date-times (read as wall time
/// in `tz`) and bare `YYYY-MM-DD` dates (read as UTC midnight).
pub fn parse_timestamp(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(tz));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return tz.from_local_datetime(&naive).earliest();
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).with_timezone(tz));
    }

    None
}

/// Date-only display of a stored timestamp, or `Invalid Date`
pub fn display_date(raw: Option<&str>, tz: &Tz, format: &str) -> String {
    raw.and_then(|raw| parse_timestamp(raw, tz))
        .map(|date| format_date(&date, format))
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// Moment tokens, longest first within each letter
const MOMENT_TOKENS: [(&str, &str); 20] = [
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DDDD", "%j"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("SSS", "%3f"),
    ("ZZ", "%z"),
    ("A", "%p"),
];

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let mut result = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'outer: while let Some(c) = rest.chars().next() {
        for (from, to) in MOMENT_TOKENS {
            if let Some(tail) = rest.strip_prefix(from) {
                result.push_str(to);
                rest = tail;
                continue 'outer;
            }
        }

        if c == '%' {
            result.push_str("%%");
        } else {
            result.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_date(&date, "YYYY-MM-DD"), "2024-01-15");
        assert_eq!(format_date(&date, "M/D/YYYY"), "1/15/2024");
        assert_eq!(format_date(&date, "MMMM D, YYYY"), "January 15, 2024");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
        assert_eq!(moment_to_chrono_format("M/D/YYYY"), "%-m/%-d/%Y");
        assert_eq!(moment_to_chrono_format("100%"), "100%%");
    }

    #[test]
    fn test_display_date_in_utc() {
        let shown = display_date(Some("2024-01-15T00:00:00Z"), &Tz::UTC, "M/D/YYYY");
        assert_eq!(shown, "1/15/2024");
    }

    #[test]
    fn test_display_date_respects_timezone() {
        let shown = display_date(
            Some("2024-01-15T00:00:00Z"),
            &chrono_tz::America::New_York,
            "M/D/YYYY",
        );
        assert_eq!(shown, "1/14/2024");
    }

    #[test]
    fn test_date_only_input() {
        let shown = display_date(Some("2024-03-01"), &Tz::UTC, "YYYY-MM-DD");
        assert_eq!(shown, "2024-03-01");
    }

    #[test]
    fn test_invalid_date() {
        assert_eq!(display_date(None, &Tz::UTC, "M/D/YYYY"), INVALID_DATE);
        assert_eq!(
            display_date(Some("yesterday"), &Tz::UTC, "M/D/YYYY"),
            INVALID_DATE
        );
    }
}
