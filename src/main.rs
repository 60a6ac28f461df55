use jobscout::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting jobscout");

    // Load configuration
    let config = startup::load_config()?;

    // Run one scan and exit
    startup::run(config).await
}
