use super::models::CalendarEvent;
use super::token::CredentialCache;
use crate::error::{provider_error, AssistantResult};
use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use url::Url;

/// Google Calendar REST API root
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Parameters of one events listing
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub calendar_id: String,
    pub time_min: DateTime<Utc>,
    pub max_results: u32,
    pub single_events: bool,
    pub order_by: String,
}

impl EventQuery {
    /// Next `max_results` single-instance events of `calendar_id`, by start time
    pub fn upcoming(calendar_id: &str, max_results: u32) -> Self {
        Self {
            calendar_id: calendar_id.to_string(),
            time_min: Utc::now(),
            max_results,
            single_events: true,
            order_by: "startTime".to_string(),
        }
    }
}

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    credentials: CredentialCache,
    scopes: Vec<String>,
    client: Client,
    api_base: String,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    Authorize(oneshot::Sender<AssistantResult<()>>),
    ListEvents(EventQuery, oneshot::Sender<AssistantResult<Vec<CalendarEvent>>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// Obtain a credential without listing anything
    pub async fn authorize(&self) -> AssistantResult<()> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(GoogleCalendarCommand::Authorize(response_tx))
            .await
            .map_err(|e| provider_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .await
            .map_err(|_| provider_error("Response channel closed"))?
    }

    /// List events matching `query`
    pub async fn list_events(&self, query: EventQuery) -> AssistantResult<Vec<CalendarEvent>> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(GoogleCalendarCommand::ListEvents(query, response_tx))
            .await
            .map_err(|e| provider_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .await
            .map_err(|_| provider_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AssistantResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        credentials: CredentialCache,
        scopes: Vec<String>,
        client: Client,
        api_base: &str,
    ) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            credentials,
            scopes,
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop.
    ///
    /// Commands are handled one at a time, so the token file only ever has one writer.
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::Authorize(response_tx) => {
                    let result = self
                        .credentials
                        .obtain_credential(&self.scopes)
                        .await
                        .map(|_| ());
                    let _ = response_tx.send(result);
                }
                GoogleCalendarCommand::ListEvents(query, response_tx) => {
                    let result = self.list_events(&query).await;
                    let _ = response_tx.send(result);
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    async fn list_events(&mut self, query: &EventQuery) -> AssistantResult<Vec<CalendarEvent>> {
        // Auth failures keep their own variant so the caller can tell them apart
        let credential = self.credentials.obtain_credential(&self.scopes).await?;
        fetch_events(&self.client, &self.api_base, &credential.token, query).await
    }
}

/// Call `events.list` and convert the items
pub async fn fetch_events(
    client: &Client,
    api_base: &str,
    access_token: &str,
    query: &EventQuery,
) -> AssistantResult<Vec<CalendarEvent>> {
    let mut url = Url::parse(api_base)
        .map_err(|e| provider_error(&format!("Failed to parse URL: {}", e)))?;

    // Calendar ids may contain `#` and `@`, so they go in as an encoded segment
    url.path_segments_mut()
        .map_err(|_| provider_error(&format!("Cannot use {} as an API base", api_base)))?
        .pop_if_empty()
        .extend(["calendars", query.calendar_id.as_str(), "events"]);

    url.query_pairs_mut()
        .append_pair("timeMin", &query.time_min.to_rfc3339())
        .append_pair("maxResults", &query.max_results.to_string())
        .append_pair("singleEvents", &query.single_events.to_string())
        .append_pair("orderBy", &query.order_by);

    debug!("Listing calendar events: {}", url);

    let response = client
        .get(url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| provider_error(&format!("Failed to fetch events: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(provider_error(&format!(
            "Failed to fetch events: HTTP {} - {}",
            status, error_body
        )));
    }

    let response_data: serde_json::Value = response
        .json()
        .await
        .map_err(|e| provider_error(&format!("Failed to parse events response: {}", e)))?;

    // A calendar without upcoming events may omit `items`
    let events = response_data
        .get("items")
        .and_then(|i| i.as_array())
        .map(|items| items.iter().map(CalendarEvent::from_api).collect())
        .unwrap_or_default();

    Ok(events)
}
