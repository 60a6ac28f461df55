use crate::components::auth::TokenManager;
use crate::components::extractor::{Completions, JobExtractor, OpenAiCompletions};
use crate::components::gmail::GmailMailbox;
use crate::components::google_calendar::{EventScheduler, GoogleCalendar};
use crate::config::Config;
use crate::error::Error;
use crate::runner;
use chrono::{Duration, Utc};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and validate the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire the real collaborators and run one scan
pub async fn run(config: Config) -> miette::Result<()> {
    let timezone = config.site_timezone()?;

    // Credentials are validated up front so an unrefreshable token
    // aborts before the inbox is touched
    let tokens = TokenManager::load(&config)?;
    tokens.ensure_valid().await?;

    let mailbox = GmailMailbox::new(tokens.clone(), config.scan.keyword_filter.clone());
    let calendar = GoogleCalendar::new(tokens, config.google_calendar_id.clone());
    let scheduler = EventScheduler::new(Box::new(calendar), timezone);

    // The language-model fallback is a strategy picked once, here, from
    // configuration presence
    let completions: Option<Box<dyn Completions>> = match &config.openai_api_key {
        Some(key) => {
            info!("Language-model fallback enabled ({})", config.openai_model);
            Some(Box::new(OpenAiCompletions::new(
                key.clone(),
                config.openai_model.clone(),
            )))
        }
        None => {
            info!("Language-model fallback disabled (no API key configured)");
            None
        }
    };
    let extractor = JobExtractor::new(config.scan.default_duration_hours, completions);

    let now = Utc::now();
    let since = now - Duration::days(i64::from(config.scan.date_range_days));
    let today = now.with_timezone(&timezone).date_naive();

    info!(
        "Scanning inbox back to {} ({} day window)",
        since.format("%Y-%m-%d %H:%M UTC"),
        config.scan.date_range_days
    );

    let summary = runner::run_once(&mailbox, &extractor, &scheduler, since, today).await?;

    info!(
        "Run complete: {} fetched, {} matched, {} skipped, {} scheduled, {} duplicates, {} failed",
        summary.fetched,
        summary.matched,
        summary.skipped,
        summary.scheduled,
        summary.duplicates,
        summary.failed
    );

    Ok(())
}
