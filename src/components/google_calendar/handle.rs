use super::actor::{EventQuery, GoogleCalendarActor, GoogleCalendarActorHandle, DEFAULT_API_BASE};
use super::consent::{ClientSecrets, LocalServerConsent, UnavailableConsent};
use super::models::CalendarEvent;
use super::token::{
    ConsentFlow, CredentialCache, FileTokenStore, OAuthRefresher, CALENDAR_READONLY_SCOPE,
};
use super::CalendarService;
use crate::config::Config;
use crate::error::AssistantResult;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    calendar_id: String,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(
        credentials: CredentialCache,
        scopes: Vec<String>,
        calendar_id: &str,
        client: Client,
        api_base: &str,
    ) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = GoogleCalendarActor::new(credentials, scopes, client, api_base);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            calendar_id: calendar_id.to_string(),
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Wire the token file, refresher and consent flow from `config` and start the actor
    pub fn from_config(config: &Config, client: Client) -> Self {
        // Consent is only needed once the token file cannot be used
        let consent: Box<dyn ConsentFlow> =
            match ClientSecrets::load(&config.google_credentials_file) {
                Ok(secrets) => Box::new(LocalServerConsent::new(secrets, client.clone())),
                Err(e) => {
                    warn!("Calendar consent unavailable: {}", e);
                    Box::new(UnavailableConsent::new(&e.to_string()))
                }
            };

        let credentials = CredentialCache::new(
            Box::new(FileTokenStore::new(&config.google_token_file)),
            Box::new(OAuthRefresher::new(client.clone())),
            consent,
        );

        info!("Google Calendar ready for {}", config.google_calendar_id);
        Self::new(
            credentials,
            vec![CALENDAR_READONLY_SCOPE.to_string()],
            &config.google_calendar_id,
            client,
            DEFAULT_API_BASE,
        )
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AssistantResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarHandle {
    async fn authorize(&self) -> AssistantResult<()> {
        self.actor_handle.authorize().await
    }

    async fn upcoming_events(&self, max_results: u32) -> AssistantResult<Vec<CalendarEvent>> {
        self.actor_handle
            .list_events(EventQuery::upcoming(&self.calendar_id, max_results))
            .await
    }
}
