use chrono::NaiveDate;

use super::models::{JobRecord, DEFAULT_ROLE};
use crate::components::gmail::EmailMessage;
use crate::utils::time::{find_date_token, parse_date_token};

/// Words that mark a message as belonging to the targeted trades
const TRADE_KEYWORDS: &[&str] = &[
    "job", "jobs", "shutdown", "shutdowns", "fitter", "fitters", "fifo", "shut", "shuts",
];

/// Role keywords and the canonical role they map to
const ROLE_KEYWORDS: &[(&str, &str)] = &[("fitter", "Fitter"), ("rigger", "Rigger")];

/// Word-level keyword check, so "shut" matches as a word but not inside
/// "shutter"
fn contains_trade_keyword(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| TRADE_KEYWORDS.contains(&word))
}

/// Canonical role named in the text, if any
fn role_from_text(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    for (keyword, role) in ROLE_KEYWORDS {
        if lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == *keyword || word == format!("{}s", keyword))
        {
            return Some(role.to_string());
        }
    }
    None
}

/// Derive an employer name from the sender's domain:
/// `Jobs <noreply@downergroup.com.au>` becomes `downergroup`
pub fn sender_employer(sender: &str) -> String {
    let address = match (sender.rfind('<'), sender.rfind('>')) {
        (Some(open), Some(close)) if open < close => &sender[open + 1..close],
        _ => sender,
    };
    address
        .rsplit('@')
        .next()
        .unwrap_or("")
        .split('.')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Rule 1: a structured subject of the form
/// `<keyword phrase> - <employer> - [location -] <date>`
pub fn subject_rule(
    message: &EmailMessage,
    today: NaiveDate,
    default_duration_hours: u32,
) -> Option<JobRecord> {
    let segments: Vec<&str> = message.subject.split(" - ").map(|s| s.trim()).collect();
    if segments.len() < 3 || !contains_trade_keyword(segments[0]) {
        return None;
    }

    // The date segment anchors the layout; employer and location sit
    // between the keyword phrase and the date
    let date_index = segments
        .iter()
        .enumerate()
        .skip(2)
        .find_map(|(i, segment)| parse_date_token(segment, today).map(|date| (i, date)));
    let (date_index, start_date) = date_index?;

    let employer = segments[1].to_string();
    let location = if date_index > 2 {
        segments[2..date_index].join(" - ")
    } else {
        String::new()
    };

    let role = role_from_text(&message.subject).unwrap_or_else(|| DEFAULT_ROLE.to_string());

    Some(JobRecord {
        role,
        employer,
        location,
        start_date,
        duration_hours: default_duration_hours,
        source_link: message.thread_link(),
    })
}

/// Rule 2: a trade keyword anywhere plus a date token in the body;
/// the employer falls back to the sender's domain
pub fn keyword_body_rule(
    message: &EmailMessage,
    today: NaiveDate,
    default_duration_hours: u32,
) -> Option<JobRecord> {
    if !contains_trade_keyword(&message.subject) && !contains_trade_keyword(&message.body) {
        return None;
    }

    let start_date = find_date_token(&message.body, today)?;

    let role = role_from_text(&message.subject)
        .or_else(|| role_from_text(&message.body))
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());

    Some(JobRecord {
        role,
        employer: sender_employer(&message.sender),
        location: String::new(),
        start_date,
        duration_hours: default_duration_hours,
        source_link: message.thread_link(),
    })
}
