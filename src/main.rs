use puheapu::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting Puheapu");

    // Load configuration
    let config = startup::load_config().await?;

    // Run until exit
    startup::start_assistant(config).await
}
