pub mod llm;
pub mod models;
pub mod rules;

pub use llm::{Completions, OpenAiCompletions};
pub use models::{JobRecord, DEFAULT_ROLE};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::components::gmail::EmailMessage;
use crate::error::ScoutResult;

/// Turns messages into [`JobRecord`]s: pattern rules first, with an
/// optional language-model fallback for messages the rules cannot read
pub struct JobExtractor {
    default_duration_hours: u32,
    completions: Option<Box<dyn Completions>>,
}

impl JobExtractor {
    pub fn new(default_duration_hours: u32, completions: Option<Box<dyn Completions>>) -> Self {
        Self {
            default_duration_hours,
            completions,
        }
    }

    /// Extract a job record from one message. `None` means the message
    /// carries no job signal; that is a skip, never an error. The
    /// language-model path runs only when no pattern rule matched, and
    /// its failures are downgraded to a miss.
    pub async fn extract(&self, message: &EmailMessage, today: NaiveDate) -> Option<JobRecord> {
        if let Some(record) = rules::subject_rule(message, today, self.default_duration_hours) {
            debug!("Subject rule matched '{}'", message.subject);
            return Some(record);
        }
        if let Some(record) = rules::keyword_body_rule(message, today, self.default_duration_hours)
        {
            debug!("Keyword rule matched '{}'", message.subject);
            return Some(record);
        }

        let completions = self.completions.as_ref()?;
        match self.extract_with_model(completions.as_ref(), message, today).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Language model fallback failed for '{}', treating as no match: {}",
                    message.subject, e
                );
                None
            }
        }
    }

    async fn extract_with_model(
        &self,
        completions: &dyn Completions,
        message: &EmailMessage,
        today: NaiveDate,
    ) -> ScoutResult<Option<JobRecord>> {
        let prompt = llm::build_prompt(message, today);
        let response = completions.complete(&prompt).await?;
        let reply = llm::parse_reply(&response)?;

        if !reply.is_job {
            return Ok(None);
        }

        // A job with no usable start date cannot be scheduled
        let start_date = match reply
            .start_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        {
            Some(date) => date,
            None => return Ok(None),
        };

        let role = reply
            .role
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());
        let employer = reply
            .employer
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| rules::sender_employer(&message.sender));
        let location = reply.location.unwrap_or_default();
        let duration_hours = reply
            .duration_hours
            .filter(|h| *h > 0)
            .unwrap_or(self.default_duration_hours);

        Ok(Some(JobRecord {
            role,
            employer,
            location,
            start_date,
            duration_hours,
            source_link: message.thread_link(),
        }))
    }
}
