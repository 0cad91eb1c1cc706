use puheapu::components::google_calendar::consent::{ClientSecrets, LocalServerConsent};
use puheapu::components::google_calendar::token::{
    ConsentFlow, FileTokenStore, TokenStore, CALENDAR_READONLY_SCOPE,
};
use puheapu::config::Config;
use puheapu::error::AssistantResult;
use reqwest::Client;

#[tokio::main]
async fn main() -> AssistantResult<()> {
    // Load configuration
    let config = Config::load()?;

    let secrets = ClientSecrets::load(&config.google_credentials_file)?;
    let consent = LocalServerConsent::new(secrets, Client::new());

    println!("Opening browser for Google Calendar authorization...");
    let credential = consent
        .authorize(&[CALENDAR_READONLY_SCOPE.to_string()])
        .await?;

    // Save token where the assistant looks for it
    FileTokenStore::new(&config.google_token_file).save(&credential)?;

    println!(
        "Token successfully saved to {}!",
        config.google_token_file.display()
    );

    Ok(())
}
