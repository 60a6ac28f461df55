use async_trait::async_trait;
use chrono::NaiveDate;
use rig::completion::{Chat, Message};
use rig::providers::openai::Client as OpenAiClient;
use serde::Deserialize;
use serde_json::from_str;
use tracing::info;

use crate::components::gmail::EmailMessage;
use crate::error::{Error, ScoutResult};

const SYSTEM_PROMPT: &str = "You are an assistant specialized in identifying mechanical fitter and \
rigger job opportunities in mining shutdowns across Australia. You analyze one email and return a \
single JSON object describing the job opportunity it contains, or flagging that it contains none.";

const USER_PROMPT_TEMPLATE: &str = "Analyze the email below and decide whether it advertises a \
genuine, current shutdown job opportunity (a job ad, a request for availability, or an invitation \
to apply with a clear start date). Generic rosters and newsletters do not count.

Return exactly one JSON object with these fields and nothing else:
{
  \"is_job\": true or false,
  \"role\": \"Fitter\" or \"Rigger\",
  \"employer\": \"company or site operator name\",
  \"location\": \"site or town name\",
  \"start_date\": \"YYYY-MM-DD\",
  \"duration_hours\": integer length of the engagement in hours
}

If the email is not a job opportunity, return {\"is_job\": false} and omit the other fields.
Resolve relative or year-less dates against today's date, {today}.

Sender: {sender}
Subject: {subject}

Email body:
{body}";

/// Completion capability behind the language-model fallback
#[async_trait]
pub trait Completions: Send + Sync {
    async fn complete(&self, prompt: &str) -> ScoutResult<String>;
}

/// OpenAI-backed [`Completions`] via Rig
pub struct OpenAiCompletions {
    api_key: String,
    model: String,
}

impl OpenAiCompletions {
    pub fn new(api_key: String, model: String) -> Self {
        Self { api_key, model }
    }
}

#[async_trait]
impl Completions for OpenAiCompletions {
    async fn complete(&self, prompt: &str) -> ScoutResult<String> {
        info!("Querying {} for job extraction", self.model);

        let client = OpenAiClient::new(&self.api_key);
        let agent = client
            .agent(&self.model)
            .preamble(SYSTEM_PROMPT)
            .temperature(0.2)
            .build();

        agent
            .chat(prompt.to_string(), Vec::<Message>::new())
            .await
            .map_err(|e| Error::LanguageModel(format!("Completion request failed: {}", e)))
    }
}

/// Fill the fixed prompt template for one message
pub fn build_prompt(message: &EmailMessage, today: NaiveDate) -> String {
    USER_PROMPT_TEMPLATE
        .replace("{today}", &today.format("%Y-%m-%d").to_string())
        .replace("{sender}", &message.sender)
        .replace("{subject}", &message.subject)
        .replace("{body}", &message.body)
}

/// Structured reply expected from the model
#[derive(Debug, Default, Deserialize)]
pub struct JobReply {
    #[serde(default)]
    pub is_job: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
}

/// Attempt to parse the JSON object out of the model response.
///
/// Models wrap JSON in code fences or prose often enough that the reply
/// is scanned for the outermost braces before parsing.
pub fn parse_reply(response: &str) -> ScoutResult<JobReply> {
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            let json_str = &response[start..=end];
            if let Ok(reply) = from_str::<JobReply>(json_str) {
                return Ok(reply);
            }
        }
    }

    // In case the response is already clean JSON
    from_str::<JobReply>(response).map_err(|e| {
        Error::LanguageModel(format!("Could not parse JSON from model response: {}", e))
    })
}
