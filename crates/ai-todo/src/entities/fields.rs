//! Lenient parsing of user- and model-supplied field values.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Resolve a due-date string against `today`.
///
/// Accepts ISO dates (`2025-03-14`), ISO date-times (the date part is kept),
/// `today`, `tomorrow`, `yesterday` and weekday names (`fri`, `next friday`),
/// which resolve to the next such day after `today`. Returns `None` for
/// blanks, `null`/`none` and anything unrecognised.
pub fn parse_due(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let value = raw.trim().to_lowercase();
    match value.as_str() {
        "" | "null" | "none" | "n/a" => return None,
        "today" => return Some(today),
        "tomorrow" => return today.checked_add_days(Days::new(1)),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Some(date) = value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(date);
    }

    let day_name = value.strip_prefix("next ").unwrap_or(&value);
    let weekday = day_name.parse::<Weekday>().ok()?;
    let ahead = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today.checked_add_days(Days::new(u64::from(ahead)))
}

/// Normalise a single tag: trim whitespace and a leading `#`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim();
    (!tag.is_empty()).then(|| tag.to_string())
}

/// Normalise every tag in a set, dropping blanks.
pub fn normalize_tags(tags: &BTreeSet<String>) -> BTreeSet<String> {
    tags.iter().filter_map(|t| normalize_tag(t)).collect()
}

/// Split a comma-separated tag list into a set of normalised tags.
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',').filter_map(normalize_tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_relative_words() {
        // 2025-03-12 is a Wednesday
        let today = day(2025, 3, 12);
        assert_eq!(parse_due("tomorrow", today), Some(day(2025, 3, 13)));
        assert_eq!(parse_due(" Today ", today), Some(today));
        assert_eq!(parse_due("yesterday", today), Some(day(2025, 3, 11)));
    }

    #[test]
    fn test_weekdays_resolve_forward() {
        let today = day(2025, 3, 12);
        assert_eq!(parse_due("friday", today), Some(day(2025, 3, 14)));
        assert_eq!(parse_due("next Mon", today), Some(day(2025, 3, 17)));
        assert_eq!(parse_due("wednesday", today), Some(day(2025, 3, 19)));
    }

    #[test]
    fn test_iso_and_garbage() {
        let today = day(2025, 3, 12);
        assert_eq!(parse_due("2025-04-01", today), Some(day(2025, 4, 1)));
        assert_eq!(parse_due("2025-04-01T17:00:00", today), Some(day(2025, 4, 1)));
        assert_eq!(parse_due("null", today), None);
        assert_eq!(parse_due("when pigs fly", today), None);
    }

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags("work, #project,, school ,work");
        let expected: Vec<&str> = vec!["project", "school", "work"];
        assert_eq!(tags.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }
}
