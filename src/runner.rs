use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info};

use crate::components::extractor::JobExtractor;
use crate::components::gmail::MailSource;
use crate::components::google_calendar::{EventScheduler, ScheduleOutcome};
use crate::error::ScoutResult;

/// Counts accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages retrieved from the inbox
    pub fetched: usize,
    /// Messages that yielded a job record
    pub matched: usize,
    /// Messages with no job signal
    pub skipped: usize,
    /// Events created
    pub scheduled: usize,
    /// Records whose event already existed
    pub duplicates: usize,
    /// Records whose scheduling failed
    pub failed: usize,
}

/// One full pass: fetch, extract, schedule.
///
/// Credential and fetch failures abort the run; a scheduling failure is
/// logged and counted, and the remaining records still get their turn.
pub async fn run_once(
    mail: &dyn MailSource,
    extractor: &JobExtractor,
    scheduler: &EventScheduler,
    since: DateTime<Utc>,
    today: NaiveDate,
) -> ScoutResult<RunSummary> {
    let messages = mail.fetch_messages(since).await?;
    info!("{} messages retrieved", messages.len());

    let mut summary = RunSummary {
        fetched: messages.len(),
        ..Default::default()
    };

    for message in &messages {
        let record = match extractor.extract(message, today).await {
            Some(record) => record,
            None => {
                summary.skipped += 1;
                continue;
            }
        };
        summary.matched += 1;

        match scheduler.schedule(&record).await {
            Ok(ScheduleOutcome::Created(_)) => summary.scheduled += 1,
            Ok(ScheduleOutcome::Duplicate) => summary.duplicates += 1,
            Err(e) => {
                summary.failed += 1;
                error!("Failed to schedule '{}': {}", record.title(), e);
            }
        }
    }

    Ok(summary)
}
