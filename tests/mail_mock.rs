use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use jobscout::components::extractor::JobExtractor;
use jobscout::components::gmail::{EmailMessage, MailSource};
use jobscout::components::google_calendar::{
    Calendar, CalendarEvent, EventPayload, EventScheduler,
};
use jobscout::error::{fetch_error, schedule_error, Error, ScoutResult};
use jobscout::runner::run_once;
use std::sync::{Arc, Mutex};

/// Mock mail source with an optional injected transport failure
struct MockMailSource {
    messages: Vec<EmailMessage>,
    fail: bool,
}

#[async_trait]
impl MailSource for MockMailSource {
    async fn fetch_messages(&self, _since: DateTime<Utc>) -> ScoutResult<Vec<EmailMessage>> {
        if self.fail {
            return Err(fetch_error("simulated transport failure"));
        }
        Ok(self.messages.clone())
    }
}

/// Recording calendar with per-title insert failures
struct MockCalendar {
    inserted: Arc<Mutex<Vec<EventPayload>>>,
    fail_on_titles: Vec<String>,
}

#[async_trait]
impl Calendar for MockCalendar {
    async fn query_events(
        &self,
        text: &str,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> ScoutResult<Vec<CalendarEvent>> {
        let events = self
            .inserted
            .lock()
            .unwrap()
            .iter()
            .filter(|payload| payload.summary.contains(text))
            .map(|payload| CalendarEvent {
                id: "evt".to_string(),
                summary: Some(payload.summary.clone()),
                ..Default::default()
            })
            .collect();
        Ok(events)
    }

    async fn insert_event(&self, payload: &EventPayload) -> ScoutResult<CalendarEvent> {
        if self.fail_on_titles.contains(&payload.summary) {
            return Err(schedule_error("simulated calendar outage"));
        }
        self.inserted.lock().unwrap().push(payload.clone());
        Ok(CalendarEvent {
            id: "evt".to_string(),
            summary: Some(payload.summary.clone()),
            ..Default::default()
        })
    }
}

fn scheduler_with(
    fail_on_titles: Vec<String>,
) -> (EventScheduler, Arc<Mutex<Vec<EventPayload>>>) {
    let inserted = Arc::new(Mutex::new(Vec::new()));
    let calendar = MockCalendar {
        inserted: Arc::clone(&inserted),
        fail_on_titles,
    };
    (
        EventScheduler::new(Box::new(calendar), chrono_tz::Australia::Perth),
        inserted,
    )
}

fn message(id: &str, subject: &str, body: &str) -> EmailMessage {
    EmailMessage {
        id: id.to_string(),
        thread_id: format!("thread-{}", id),
        sender: "recruiter@example.com".to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
        received: Utc.with_ymd_and_hms(2026, 8, 6, 22, 0, 0).single(),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
}

fn since() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 6, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn test_full_pass_schedules_matching_messages() {
    let mail = MockMailSource {
        messages: vec![
            message("m1", "Shutdown job - BHP - Port Hedland - 14th Sept", ""),
            message("m2", "Weekly newsletter", "Nothing to see here."),
        ],
        fail: false,
    };
    let extractor = JobExtractor::new(12, None);
    let (scheduler, inserted) = scheduler_with(Vec::new());

    let summary = run_once(&mail, &extractor, &scheduler, since(), today())
        .await
        .unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.scheduled, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(inserted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_aborts_with_zero_events() {
    let mail = MockMailSource {
        messages: vec![message(
            "m1",
            "Shutdown job - BHP - Port Hedland - 14th Sept",
            "",
        )],
        fail: true,
    };
    let extractor = JobExtractor::new(12, None);
    let (scheduler, inserted) = scheduler_with(Vec::new());

    let result = run_once(&mail, &extractor, &scheduler, since(), today()).await;

    assert!(matches!(result, Err(Error::Fetch(_))));
    assert_eq!(inserted.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn test_schedule_failure_does_not_stop_later_records() {
    let mail = MockMailSource {
        messages: vec![
            message("m1", "Shutdown job - BHP - Port Hedland - 14th Sept", ""),
            message("m2", "Shutdown job - FMG - Cloudbreak - 21st Sept", ""),
        ],
        fail: false,
    };
    let extractor = JobExtractor::new(12, None);
    // First record's insert fails, second must still go through
    let (scheduler, inserted) =
        scheduler_with(vec!["Fitter - BHP - Port Hedland".to_string()]);

    let summary = run_once(&mail, &extractor, &scheduler, since(), today())
        .await
        .unwrap();

    assert_eq!(summary.matched, 2);
    assert_eq!(summary.scheduled, 1);
    assert_eq!(summary.failed, 1);

    let payloads = inserted.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].summary, "Fitter - FMG - Cloudbreak");
}

#[tokio::test]
async fn test_second_run_over_same_inbox_is_idempotent() {
    let mail = MockMailSource {
        messages: vec![message(
            "m1",
            "Shutdown job - BHP - Port Hedland - 14th Sept",
            "",
        )],
        fail: false,
    };
    let extractor = JobExtractor::new(12, None);
    let (scheduler, inserted) = scheduler_with(Vec::new());

    let first = run_once(&mail, &extractor, &scheduler, since(), today())
        .await
        .unwrap();
    assert_eq!(first.scheduled, 1);
    assert_eq!(first.duplicates, 0);

    let second = run_once(&mail, &extractor, &scheduler, since(), today())
        .await
        .unwrap();
    assert_eq!(second.scheduled, 0);
    assert_eq!(second.duplicates, 1);

    assert_eq!(inserted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_inbox_is_a_clean_run() {
    let mail = MockMailSource {
        messages: Vec::new(),
        fail: false,
    };
    let extractor = JobExtractor::new(12, None);
    let (scheduler, inserted) = scheduler_with(Vec::new());

    let summary = run_once(&mail, &extractor, &scheduler, since(), today())
        .await
        .unwrap();

    assert_eq!(summary, Default::default());
    assert_eq!(inserted.lock().unwrap().len(), 0);
}
