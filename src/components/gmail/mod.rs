pub mod body;
pub mod models;

pub use models::EmailMessage;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::components::auth::TokenManager;
use crate::error::{fetch_error, ScoutResult};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Upper bound on messages pulled per run; a daily scan over a personal
/// inbox stays far below this, so no pagination
const MAX_RESULTS: u32 = 500;

/// Read-only mail retrieval capability
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Fetch messages received after `since` that match the keyword filter
    async fn fetch_messages(&self, since: DateTime<Utc>) -> ScoutResult<Vec<EmailMessage>>;
}

/// Gmail REST implementation of [`MailSource`]
pub struct GmailMailbox {
    client: Client,
    tokens: TokenManager,
    keyword_filter: String,
}

impl GmailMailbox {
    pub fn new(tokens: TokenManager, keyword_filter: String) -> Self {
        Self {
            client: Client::new(),
            tokens,
            keyword_filter,
        }
    }

    /// Fetch one message in full and reduce it to an [`EmailMessage`]
    async fn get_message(&self, access_token: &str, id: &str) -> ScoutResult<EmailMessage> {
        let url = format!("{}/messages/{}?format=full", GMAIL_API_BASE, id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| fetch_error(&format!("Failed to fetch message {}: {}", id, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(fetch_error(&format!(
                "Failed to fetch message {}: HTTP {} - {}",
                id, status, error_body
            )));
        }

        let message: Value = response
            .json()
            .await
            .map_err(|e| fetch_error(&format!("Failed to parse message response: {}", e)))?;

        let payload = message
            .get("payload")
            .ok_or_else(|| fetch_error(&format!("Message {} has no payload", id)))?;

        let headers = payload
            .get("headers")
            .and_then(|h| h.as_array())
            .cloned()
            .unwrap_or_default();

        let subject = header_value(&headers, "Subject").unwrap_or_else(|| "(No Subject)".to_string());
        let sender = header_value(&headers, "From").unwrap_or_else(|| "(Unknown)".to_string());

        let thread_id = message
            .get("threadId")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();

        // internalDate is epoch milliseconds, delivered as a string
        let received = message
            .get("internalDate")
            .and_then(|d| d.as_str())
            .and_then(|d| d.parse::<i64>().ok())
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

        let body = body::extract_body(payload);

        Ok(EmailMessage {
            id: id.to_string(),
            thread_id,
            sender,
            subject,
            body,
            received,
        })
    }
}

#[async_trait]
impl MailSource for GmailMailbox {
    async fn fetch_messages(&self, since: DateTime<Utc>) -> ScoutResult<Vec<EmailMessage>> {
        let access_token = self.tokens.bearer_token().await?;

        // A coarse server-side filter keeps the per-message fetches (and
        // any model calls downstream) to a handful of candidates
        let query = format!("after:{} ({})", since.timestamp(), self.keyword_filter);

        let mut url = Url::parse(&format!("{}/messages", GMAIL_API_BASE))
            .map_err(|e| fetch_error(&format!("Failed to parse URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("maxResults", &MAX_RESULTS.to_string());

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| fetch_error(&format!("Failed to list messages: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(fetch_error(&format!(
                "Failed to list messages: HTTP {} - {}",
                status, error_body
            )));
        }

        let listing: Value = response
            .json()
            .await
            .map_err(|e| fetch_error(&format!("Failed to parse message listing: {}", e)))?;

        // An absent "messages" key means an empty inbox window, not an error
        let ids: Vec<String> = listing
            .get("messages")
            .and_then(|m| m.as_array())
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
                    .map(|id| id.to_string())
                    .collect()
            })
            .unwrap_or_default();

        info!("Gmail listing returned {} candidate messages", ids.len());

        let mut emails = Vec::with_capacity(ids.len());
        for id in &ids {
            emails.push(self.get_message(&access_token, id).await?);
        }

        Ok(emails)
    }
}

fn header_value(headers: &[Value], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.get("name").and_then(|n| n.as_str()) == Some(name))
        .and_then(|h| h.get("value"))
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}
