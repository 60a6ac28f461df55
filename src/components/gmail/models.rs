use chrono::{DateTime, Utc};

/// A single inbox message, reduced to the fields the extractor consumes
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EmailMessage {
    pub id: String,
    pub thread_id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub received: Option<DateTime<Utc>>,
}

impl EmailMessage {
    /// Permalink to the Gmail thread this message belongs to
    pub fn thread_link(&self) -> Option<String> {
        if self.thread_id.is_empty() {
            return None;
        }
        Some(format!(
            "https://mail.google.com/mail/u/0/#inbox/{}",
            self.thread_id
        ))
    }
}
