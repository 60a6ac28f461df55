pub mod models;
pub mod scheduler;

pub use models::{CalendarEvent, EventPayload, EventTime};
pub use scheduler::{EventScheduler, ScheduleOutcome};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::components::auth::TokenManager;
use crate::error::{schedule_error, ScoutResult};

/// Calendar capabilities the scheduler needs: a dedup query and an insert
#[async_trait]
pub trait Calendar: Send + Sync {
    /// Events matching `text` between the two instants
    async fn query_events(
        &self,
        text: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> ScoutResult<Vec<CalendarEvent>>;

    /// Create one event, returning the stored representation
    async fn insert_event(&self, payload: &EventPayload) -> ScoutResult<CalendarEvent>;
}

/// Google Calendar REST implementation of [`Calendar`]
pub struct GoogleCalendar {
    client: Client,
    tokens: TokenManager,
    calendar_id: String,
}

impl GoogleCalendar {
    pub fn new(tokens: TokenManager, calendar_id: String) -> Self {
        Self {
            client: Client::new(),
            tokens,
            calendar_id,
        }
    }

    fn events_url(&self) -> ScoutResult<Url> {
        let url_str = format!(
            "https://www.googleapis.com/calendar/v3/calendars/{}/events",
            self.calendar_id
        );
        Url::parse(&url_str).map_err(|e| schedule_error(&format!("Failed to parse URL: {}", e)))
    }
}

#[async_trait]
impl Calendar for GoogleCalendar {
    async fn query_events(
        &self,
        text: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> ScoutResult<Vec<CalendarEvent>> {
        let access_token = self.tokens.bearer_token().await?;

        let mut url = self.events_url()?;
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("timeMin", &time_min.to_rfc3339())
            .append_pair("timeMax", &time_max.to_rfc3339())
            .append_pair("singleEvents", "true");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| schedule_error(&format!("Failed to query events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(schedule_error(&format!(
                "Failed to query events: HTTP {} - {}",
                status, error_body
            )));
        }

        let response_data: Value = response
            .json()
            .await
            .map_err(|e| schedule_error(&format!("Failed to parse events response: {}", e)))?;

        let events = response_data
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(events.iter().map(parse_event).collect())
    }

    async fn insert_event(&self, payload: &EventPayload) -> ScoutResult<CalendarEvent> {
        let access_token = self.tokens.bearer_token().await?;
        let url = self.events_url()?;

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(payload)
            .send()
            .await
            .map_err(|e| schedule_error(&format!("Failed to create event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(schedule_error(&format!(
                "Failed to create event: HTTP {} - {}",
                status, error_body
            )));
        }

        let created: Value = response
            .json()
            .await
            .map_err(|e| schedule_error(&format!("Failed to parse created event: {}", e)))?;

        Ok(parse_event(&created))
    }
}

/// Reduce an API event object to the fields we track
fn parse_event(event: &Value) -> CalendarEvent {
    let nested = |outer: &str, inner: &str| -> Option<String> {
        event
            .get(outer)
            .and_then(|o| o.as_object())
            .and_then(|o| o.get(inner))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    CalendarEvent {
        id: event
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or("")
            .to_string(),
        summary: event
            .get("summary")
            .and_then(|s| s.as_str())
            .map(|s| s.to_string()),
        description: event
            .get("description")
            .and_then(|s| s.as_str())
            .map(|s| s.to_string()),
        start_date_time: nested("start", "dateTime"),
        start_date: nested("start", "date"),
        end_date_time: nested("end", "dateTime"),
        end_date: nested("end", "date"),
    }
}
