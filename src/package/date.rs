//! Issue date normalization for directory names.

use chrono::{DateTime, Datelike, NaiveDate};

/// Name used when a record carries no usable date.
pub const UNKNOWN_ISSUE_DATE: &str = "0000-00-00";

/// Strict formats tried in order before falling back to the lenient parse.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%Y%m%d",
];

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Normalizes a raw date string into a directory name.
///
/// Full dates become `YYYY-MM-DD`. Partial dates keep the components that
/// could be found (`1988-07`, `1988`). Anything without a recognizable year is
/// returned as-is, with path separators replaced so the result stays a single
/// path segment.
#[must_use]
pub fn normalize_issue_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UNKNOWN_ISSUE_DATE.to_string();
    }
    if let Some(date) = parse_full_date(trimmed) {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Some(partial) = parse_partial_date(trimmed) {
        return partial;
    }
    trimmed
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

fn parse_full_date(value: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }
    // Timestamps without an offset, e.g. `1988-07-13T00:00:00`.
    if let Some((date_part, _)) = value.split_once('T')
        && let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
    {
        return Some(date);
    }
    DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .find(|date| year_written_in_full(*date, value))
}

/// Rejects parses that took a year from fewer than four written digits,
/// e.g. `July 1988` read as day 19 of year 88.
fn year_written_in_full(date: NaiveDate, value: &str) -> bool {
    date.year() >= 1000 && value.contains(&date.year().to_string())
}

/// Year, then month and day when present, from loosely formatted input.
fn parse_partial_date(value: &str) -> Option<String> {
    let tokens: Vec<&str> = value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    let year_index = tokens
        .iter()
        .position(|token| token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()))?;
    let year = tokens[year_index];

    let month_by_name = tokens.iter().find_map(|token| month_from_name(token));
    let numbers: Vec<u32> = tokens
        .iter()
        .enumerate()
        .filter(|(index, token)| {
            *index != year_index && token.len() <= 2 && token.chars().all(|c| c.is_ascii_digit())
        })
        .filter_map(|(_, token)| token.parse().ok())
        .collect();

    // Month precedes day both in ISO order and in US order, unless the
    // first number cannot be a month.
    let (month, day) = match month_by_name {
        Some(month) => (Some(month), numbers.first().copied()),
        None => match (numbers.first().copied(), numbers.get(1).copied()) {
            (Some(first), Some(second)) if first > 12 && second <= 12 => (Some(second), Some(first)),
            (first, second) => (first, second),
        },
    };

    let month = month.filter(|m| (1..=12).contains(m));
    let day = day.filter(|d| (1..=31).contains(d)).filter(|_| month.is_some());

    let mut parts = vec![year.to_string()];
    if let Some(month) = month {
        parts.push(format!("{month:02}"));
    }
    if let Some(day) = day {
        parts.push(format!("{day:02}"));
    }
    Some(parts.join("-"))
}

fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let prefix = token[..3].to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| *name == prefix)
        .and_then(|index| u32::try_from(index + 1).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_dates_normalize_to_iso() {
        let cases = [
            ("1988-07-13", "1988-07-13"),
            ("07/13/1988", "1988-07-13"),
            ("7/13/1988", "1988-07-13"),
            ("July 13, 1988", "1988-07-13"),
            ("Jul 13, 1988", "1988-07-13"),
            ("13 July 1988", "1988-07-13"),
            ("1988/07/13", "1988-07-13"),
            ("19880713", "1988-07-13"),
            ("1988-07-13T00:00:00", "1988-07-13"),
            ("1988-07-13T10:00:00+02:00", "1988-07-13"),
            ("  1988-07-13  ", "1988-07-13"),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_issue_date(raw), expected, "input: {raw}");
        }
    }

    #[test]
    fn test_partial_dates_keep_found_components() {
        assert_eq!(normalize_issue_date("1988-07"), "1988-07");
        assert_eq!(normalize_issue_date("July 1988"), "1988-07");
        assert_eq!(normalize_issue_date("Summer 1988"), "1988");
        assert_eq!(normalize_issue_date("1988-7-3?"), "1988-07-03");
    }

    #[test]
    fn test_month_and_year_are_not_read_as_a_day() {
        assert_eq!(normalize_issue_date("Jul 1988"), "1988-07");
        assert_eq!(normalize_issue_date("March 1901"), "1901-03");
        assert_eq!(normalize_issue_date("December 2001"), "2001-12");
        assert_eq!(normalize_issue_date("May 1920"), "1920-05");
    }

    #[test]
    fn test_day_first_dates_keep_month_and_day() {
        assert_eq!(normalize_issue_date("13-07-1988"), "1988-07-13");
        assert_eq!(normalize_issue_date("13.07.1988"), "1988-07-13");
        assert_eq!(normalize_issue_date("07-13-1988"), "1988-07-13");
        assert_eq!(normalize_issue_date("13-7-1988?"), "1988-07-13");
    }

    #[test]
    fn test_unparseable_date_is_kept_raw() {
        assert_eq!(normalize_issue_date("n.d."), "n.d.");
        assert_eq!(normalize_issue_date("undated/issue"), "undated_issue");
    }

    #[test]
    fn test_empty_date_uses_sentinel() {
        assert_eq!(normalize_issue_date("   "), UNKNOWN_ISSUE_DATE);
    }

    #[test]
    fn test_month_from_name() {
        assert_eq!(month_from_name("September"), Some(9));
        assert_eq!(month_from_name("dec"), Some(12));
        assert_eq!(month_from_name("Summer"), None);
        assert_eq!(month_from_name("ju"), None);
    }
}
