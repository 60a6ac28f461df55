use chrono::NaiveDate;

/// Role assumed when a message carries a job signal but no role keyword
pub const DEFAULT_ROLE: &str = "Fitter";

/// Structured job opportunity extracted from a message
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobRecord {
    pub role: String,
    pub employer: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub duration_hours: u32,
    /// Permalink back to the source mail thread
    pub source_link: Option<String>,
}

impl JobRecord {
    /// Derived event title: the non-empty identity fields joined in a
    /// fixed order. Together with the start date this is the dedup key.
    pub fn title(&self) -> String {
        [&self.role, &self.employer, &self.location]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" - ")
    }
}
