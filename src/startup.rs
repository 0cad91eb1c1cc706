use crate::commands::CommandContext;
use crate::components::answers::{AnswerResolver, OpenAiClient, WikipediaClient};
use crate::components::google_calendar::{CalendarService, GoogleCalendarHandle};
use crate::components::voice::{
    keyboard, CommandListener, CommandSpeaker, KeyboardFeed, Listener, SystemBrowser,
};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{AssistantResult, Error};
use crate::shutdown;
use crate::surface::TerminalSurface;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How long running cycles may take to finish after shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// User agent sent to the answer services
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            rust_i18n::set_locale(&config.locale);
            info!("Setting locale to {}", config.locale);
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// HTTP client shared by the calendar and the answer services
pub fn http_client() -> AssistantResult<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

/// Build every collaborator the dispatch cycles need
pub fn build_context(
    config: &Config,
    client: Client,
    calendar: Arc<dyn CalendarService>,
    shutdown: CancellationToken,
) -> AssistantResult<(CommandContext, Option<KeyboardFeed>)> {

    let answers = AnswerResolver::new(
        Arc::new(OpenAiClient::new(
            client.clone(),
            &config.openai_api_url,
            config.openai_api_key.clone(),
            &config.openai_model,
        )),
        Arc::new(WikipediaClient::new(client, &config.wikipedia_api_url)),
        config.answer_sentences,
    );

    let (listener, keyboard_feed): (Arc<dyn Listener>, Option<KeyboardFeed>) =
        match &config.capture_command {
            Some(command) => (Arc::new(CommandListener::new(command)), None),
            None => {
                let (listener, feed) = keyboard();
                (Arc::new(listener), Some(feed))
            }
        };

    let ctx = CommandContext {
        speaker: Arc::new(CommandSpeaker::new(config.speak_command.clone())),
        listener,
        calendar,
        answers,
        browser: Arc::new(SystemBrowser::new(config.browser_command.clone())),
        calendar_url: config.calendar_url.clone(),
        max_events: config.calendar_max_events,
        shutdown,
    };

    Ok((ctx, keyboard_feed))
}

/// Start the calendar actor and run the assistant until it is told to stop
pub async fn start_assistant(config: Config) -> miette::Result<()> {
    let client = http_client()?;
    let calendar = GoogleCalendarHandle::from_config(&config, client.clone());

    // Create shutdown token shared by the surface, the exit command and signals
    let shutdown_token = CancellationToken::new();

    let (ctx, keyboard_feed) = build_context(
        &config,
        client,
        Arc::new(calendar.clone()),
        shutdown_token.clone(),
    )?;

    // Spawn signal handler task
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(signal_token).await;
    });

    let dispatcher = Dispatcher::new(Arc::new(ctx));
    let surface = TerminalSurface::new(dispatcher.clone(), shutdown_token, keyboard_feed);

    info!("Assistant ready");
    let result = surface.run(BufReader::new(tokio::io::stdin())).await;

    dispatcher.drain(SHUTDOWN_GRACE).await;

    if let Err(e) = calendar.shutdown().await {
        error!("Error shutting down Google Calendar: {:?}", e);
    } else {
        info!("Google Calendar shut down");
    }

    result.map_err(Into::into)
}
