use crate::error::{env_error, Error, ScoutResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

/// Default Gmail keyword expression, matching the trades this tool targets
pub const DEFAULT_KEYWORD_FILTER: &str =
    "job OR shutdown OR shutdowns OR fitter OR fitters OR fifo OR shut OR shuts";

/// Default site timezone (FIFO mining sites in Western Australia)
pub const DEFAULT_TIMEZONE: &str = "Australia/Perth";

/// Default event length for a shutdown shift, in hours
pub const DEFAULT_DURATION_HOURS: u32 = 12;

/// Scan tuning options, overridable via `config/scan.toml` and environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// How many days back to scan the inbox
    pub date_range_days: u32,
    /// Gmail keyword/sender match expression
    pub keyword_filter: String,
    /// Fallback event length when a message gives no duration
    pub default_duration_hours: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            date_range_days: 1,
            keyword_filter: DEFAULT_KEYWORD_FILTER.to_string(),
            default_duration_hours: DEFAULT_DURATION_HOURS,
        }
    }
}

/// Partial scan options as they appear in the optional TOML file
#[derive(Debug, Default, Deserialize)]
struct ScanOptionsFile {
    date_range_days: Option<u32>,
    keyword_filter: Option<String>,
    default_duration_hours: Option<u32>,
}

/// Main configuration structure for the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Calendar ID receiving job events
    pub google_calendar_id: String,
    /// Base64-encoded OAuth token blob (CI path), if provided
    pub gmail_token_base64: Option<String>,
    /// Path of the on-disk OAuth token blob
    pub token_file: String,
    /// OpenAI API key; presence enables the language-model fallback
    pub openai_api_key: Option<String>,
    /// Completion model for the language-model fallback
    pub openai_model: String,
    /// Timezone of the work sites, used for event times and day bounds
    pub timezone: String,
    /// Scan tuning options
    pub scan: ScanOptions,
}

impl Config {
    /// Load configuration from environment and the optional scan file
    pub fn load() -> ScoutResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").map_err(|_| env_error("GOOGLE_CALENDAR_ID"))?;

        let gmail_token_base64 = env::var("GMAIL_API_TOKEN_BASE64").ok();
        let token_file = env::var("TOKEN_FILE").unwrap_or_else(|_| String::from("token.json"));

        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| String::from("gpt-4o"));

        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from(DEFAULT_TIMEZONE));

        let scan = Self::load_scan_options()?;

        Ok(Config {
            google_calendar_id,
            gmail_token_base64,
            token_file,
            openai_api_key,
            openai_model,
            timezone,
            scan,
        })
    }

    /// Parse the configured timezone
    pub fn site_timezone(&self) -> ScoutResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| Error::Config(format!("Unknown timezone: {}", self.timezone)))
    }

    /// Merge scan options from defaults, the optional file, and environment
    fn load_scan_options() -> ScoutResult<ScanOptions> {
        let mut scan = ScanOptions::default();

        // Load overrides from file if it exists
        if let Ok(content) = fs::read_to_string("config/scan.toml") {
            let file: ScanOptionsFile = toml::from_str(&content)?;
            if let Some(days) = file.date_range_days {
                scan.date_range_days = days;
            }
            if let Some(filter) = file.keyword_filter {
                scan.keyword_filter = filter;
            }
            if let Some(hours) = file.default_duration_hours {
                scan.default_duration_hours = hours;
            }
        }

        // Environment takes precedence over the file
        if let Ok(days) = env::var("SCAN_DAYS") {
            scan.date_range_days = days
                .parse::<u32>()
                .map_err(|_| Error::Environment("Invalid SCAN_DAYS format".to_string()))?;
        }
        if let Ok(filter) = env::var("KEYWORD_FILTER") {
            scan.keyword_filter = filter;
        }
        if let Ok(hours) = env::var("DEFAULT_DURATION_HOURS") {
            scan.default_duration_hours = hours.parse::<u32>().map_err(|_| {
                Error::Environment("Invalid DEFAULT_DURATION_HOURS format".to_string())
            })?;
        }

        Ok(scan)
    }
}
