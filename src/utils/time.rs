use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Month names accepted in date tokens; any prefix of three or more
/// letters matches ("Sept", "Mar", "january")
const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolve a month name or abbreviation to its number
fn month_from_name(name: &str) -> Option<u32> {
    let name = name.trim_end_matches('.').to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|m| m.starts_with(&name))
        .map(|i| i as u32 + 1)
}

/// Strip an ordinal suffix from a day token ("14th" -> 14)
fn parse_day(token: &str) -> Option<u32> {
    let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let rest = &token[digits.len()..];
    if !matches!(rest, "" | "st" | "nd" | "rd" | "th") {
        return None;
    }
    digits.parse::<u32>().ok()
}

/// Parse a single date token into a calendar date.
///
/// Accepted shapes: `2026-09-14`, `14/9`, `14/09/2026`, `14/9/26`, and
/// day-month words like `14th Sept` or `3 March`. A token without a year
/// resolves to the current year.
pub fn parse_date_token(token: &str, today: NaiveDate) -> Option<NaiveDate> {
    let token = token.trim().trim_end_matches([',', '.', ';', ':', '!', '?']);
    if token.is_empty() {
        return None;
    }

    // ISO date
    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Some(date);
    }

    // Slash-separated day/month with optional year
    if token.contains('/') {
        let parts: Vec<&str> = token.split('/').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return None;
        }
        let day = parts[0].parse::<u32>().ok()?;
        let month = parts[1].parse::<u32>().ok()?;
        let year = match parts.get(2) {
            Some(y) => {
                let y = y.parse::<i32>().ok()?;
                if y < 100 {
                    2000 + y
                } else {
                    y
                }
            }
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // Day followed by a month name ("14th Sept")
    let words: Vec<&str> = token.split_whitespace().collect();
    if words.len() == 2 {
        let day = parse_day(words[0])?;
        let month = month_from_name(words[1])?;
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }

    None
}

/// Scan free text for the first recognizable date token
pub fn find_date_token(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let words: Vec<&str> = text.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if let Some(date) = parse_date_token(word, today) {
            return Some(date);
        }
        // Two-word window for "14th Sept" shapes
        if let Some(next) = words.get(i + 1) {
            let pair = format!("{} {}", word, next);
            if let Some(date) = parse_date_token(&pair, today) {
                return Some(date);
            }
        }
    }
    None
}

/// UTC bounds of a calendar day in the given timezone
pub fn local_day_bounds(date: NaiveDate, timezone: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = timezone
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()?;
    let end = start + Duration::days(1);
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

/// A local wall-clock time on a given day, expressed in the timezone
pub fn local_datetime(
    date: NaiveDate,
    hour: u32,
    timezone: Tz,
) -> Option<DateTime<Tz>> {
    timezone
        .from_local_datetime(&date.and_hms_opt(hour, 0, 0)?)
        .earliest()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_date_token("2026-09-14", today()),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );
    }

    #[test]
    fn test_parse_slash_dates() {
        assert_eq!(
            parse_date_token("14/9", today()),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );
        assert_eq!(
            parse_date_token("14/09/2027", today()),
            NaiveDate::from_ymd_opt(2027, 9, 14)
        );
        assert_eq!(
            parse_date_token("14/9/26", today()),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );
        // Month out of range
        assert_eq!(parse_date_token("14/13", today()), None);
    }

    #[test]
    fn test_parse_day_month_words() {
        assert_eq!(
            parse_date_token("14th Sept", today()),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );
        assert_eq!(
            parse_date_token("3rd March", today()),
            NaiveDate::from_ymd_opt(2026, 3, 3)
        );
        assert_eq!(
            parse_date_token("1 Jan", today()),
            NaiveDate::from_ymd_opt(2026, 1, 1)
        );
        // Ordinal suffix must be a real one
        assert_eq!(parse_date_token("14xx Sept", today()), None);
        // Two-letter month abbreviations are too ambiguous
        assert_eq!(parse_date_token("14 Ma", today()), None);
    }

    #[test]
    fn test_find_date_token_in_text() {
        let body = "Shutdown crew wanted, starting 14th Sept at Roy Hill.";
        assert_eq!(
            find_date_token(body, today()),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );

        assert_eq!(find_date_token("no dates in here", today()), None);
    }

    #[test]
    fn test_trailing_punctuation_ignored() {
        assert_eq!(
            parse_date_token("14th Sept.", today()),
            NaiveDate::from_ymd_opt(2026, 9, 14)
        );
    }

    #[test]
    fn test_local_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();
        let (start, end) = local_day_bounds(date, chrono_tz::Australia::Perth).unwrap();
        // Perth is UTC+8 year-round
        assert_eq!(start.to_rfc3339(), "2026-09-13T16:00:00+00:00");
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_local_datetime() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();
        let dt = local_datetime(date, 6, chrono_tz::Australia::Perth).unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-09-14T06:00:00+08:00");
    }
}
