use chrono::Duration;
use chrono_tz::Tz;
use tracing::info;

use super::models::{CalendarEvent, EventPayload, EventTime};
use super::Calendar;
use crate::components::extractor::JobRecord;
use crate::error::{schedule_error, ScoutResult};
use crate::utils::time::{local_datetime, local_day_bounds};

/// Hour of the site day at which a shift block is anchored
const SHIFT_START_HOUR: u32 = 6;

/// What scheduling one record did
#[derive(Debug)]
pub enum ScheduleOutcome {
    Created(CalendarEvent),
    Duplicate,
}

/// Maps job records to calendar events, creating each at most once.
///
/// Dedup is by derived title within the start date's local day. Two
/// genuinely distinct jobs sharing both would be collapsed; that
/// heuristic is accepted as-is.
pub struct EventScheduler {
    calendar: Box<dyn Calendar>,
    timezone: Tz,
}

impl EventScheduler {
    pub fn new(calendar: Box<dyn Calendar>, timezone: Tz) -> Self {
        Self { calendar, timezone }
    }

    /// Create a calendar event for the record unless one already exists
    pub async fn schedule(&self, record: &JobRecord) -> ScoutResult<ScheduleOutcome> {
        let title = record.title();

        let (day_start, day_end) = local_day_bounds(record.start_date, self.timezone)
            .ok_or_else(|| schedule_error("Failed to compute day bounds for event date"))?;

        // The q= match is full-text, so filter down to exact-title hits
        let existing = self.calendar.query_events(&title, day_start, day_end).await?;
        if existing
            .iter()
            .any(|event| event.summary.as_deref() == Some(title.as_str()))
        {
            info!("Skipped duplicate event: {} on {}", title, record.start_date);
            return Ok(ScheduleOutcome::Duplicate);
        }

        let start = local_datetime(record.start_date, SHIFT_START_HOUR, self.timezone)
            .ok_or_else(|| schedule_error("Failed to compute event start time"))?;
        let end = start + Duration::hours(i64::from(record.duration_hours));

        let payload = EventPayload {
            summary: title.clone(),
            description: describe(record),
            location: record.location.clone(),
            start: EventTime {
                date_time: start.to_rfc3339(),
                time_zone: self.timezone.name().to_string(),
            },
            end: EventTime {
                date_time: end.to_rfc3339(),
                time_zone: self.timezone.name().to_string(),
            },
        };

        let created = self.calendar.insert_event(&payload).await?;
        info!("Calendar entry added: {} on {}", title, record.start_date);
        Ok(ScheduleOutcome::Created(created))
    }
}

fn describe(record: &JobRecord) -> String {
    let mut description = format!(
        "Role: {}\nEmployer: {}\nLocation: {}\nDuration: {} hours\n",
        record.role, record.employer, record.location, record.duration_hours
    );
    if let Some(link) = &record.source_link {
        description.push_str(&format!("\nEmail thread: {}\n", link));
    }
    description
}
