#![allow(dead_code)]

use async_trait::async_trait;
use puheapu::commands::CommandContext;
use puheapu::components::answers::{AnswerResolver, AnswerService, LookupError, LookupService};
use puheapu::components::google_calendar::token::{
    ConsentFlow, Credential, RefreshError, TokenRefresher, TokenStore, CALENDAR_READONLY_SCOPE,
};
use puheapu::components::google_calendar::{CalendarEvent, CalendarService};
use puheapu::components::voice::{BrowserLauncher, Listener, Speaker};
use puheapu::error::{auth_error, capture_error, provider_error, speech_error, AssistantResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Records everything the assistant says
#[derive(Default)]
pub struct RecordingSpeaker {
    pub lines: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingSpeaker {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> AssistantResult<()> {
        if self.fail {
            return Err(speech_error("audio device gone"));
        }
        self.lines.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Hears the same thing every time, or fails when `None`
pub struct ScriptedListener(pub Option<String>);

impl ScriptedListener {
    pub fn hearing(utterance: &str) -> Self {
        Self(Some(utterance.to_string()))
    }
}

#[async_trait]
impl Listener for ScriptedListener {
    async fn listen(&self) -> AssistantResult<String> {
        self.0
            .clone()
            .ok_or_else(|| capture_error("could not understand audio"))
    }
}

/// Blocks in `listen` until released
#[derive(Default)]
pub struct BlockingListener {
    pub calls: AtomicUsize,
    pub release: CancellationToken,
}

#[async_trait]
impl Listener for BlockingListener {
    async fn listen(&self) -> AssistantResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.cancelled().await;
        Ok("open calendar".to_string())
    }
}

/// Mock calendar returning predefined events
pub enum MockCalendar {
    Events(Vec<CalendarEvent>),
    AuthFailure,
    ProviderFailure,
}

impl MockCalendar {
    pub fn with_events() -> Self {
        MockCalendar::Events(vec![
            CalendarEvent {
                id: "event1".to_string(),
                summary: Some("Test Event 1".to_string()),
                start_date_time: Some("2023-01-01T10:00:00Z".to_string()),
                ..Default::default()
            },
            CalendarEvent {
                id: "event2".to_string(),
                summary: None,
                start_date: Some("2023-01-02".to_string()),
                ..Default::default()
            },
        ])
    }
}

#[async_trait]
impl CalendarService for MockCalendar {
    async fn authorize(&self) -> AssistantResult<()> {
        match self {
            MockCalendar::AuthFailure => Err(auth_error("no interactive channel")),
            _ => Ok(()),
        }
    }

    async fn upcoming_events(&self, max_results: u32) -> AssistantResult<Vec<CalendarEvent>> {
        match self {
            MockCalendar::Events(events) => Ok(events
                .iter()
                .take(max_results as usize)
                .cloned()
                .collect()),
            MockCalendar::AuthFailure => Err(auth_error("no interactive channel")),
            MockCalendar::ProviderFailure => Err(provider_error("HTTP 500")),
        }
    }
}

/// Primary answer stub, `None` always fails
#[derive(Default)]
pub struct StubPrimary {
    pub answer: Option<String>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl AnswerService for StubPrimary {
    async fn complete(&self, _query: &str) -> AssistantResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .clone()
            .ok_or_else(|| provider_error("insufficient_quota"))
    }
}

/// Secondary lookup stub, `None` finds nothing
#[derive(Default)]
pub struct StubLookup {
    pub answer: Option<String>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl LookupService for StubLookup {
    async fn summarize(&self, _query: &str, _max_sentences: u32) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().ok_or(LookupError::NotFound)
    }
}

/// Lookup that writes into the speaker's transcript, so tests can see when it ran
pub struct TranscriptLookup {
    pub speaker: Arc<RecordingSpeaker>,
    pub answer: String,
}

#[async_trait]
impl LookupService for TranscriptLookup {
    async fn summarize(&self, _query: &str, _max_sentences: u32) -> Result<String, LookupError> {
        self.speaker
            .lines
            .lock()
            .unwrap()
            .push("<lookup>".to_string());
        Ok(self.answer.clone())
    }
}

/// Remembers opened URLs
#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserLauncher for RecordingBrowser {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

/// Everything a test may want to inspect after a cycle
pub struct Harness {
    pub speaker: Arc<RecordingSpeaker>,
    pub browser: Arc<RecordingBrowser>,
    pub primary: Arc<StubPrimary>,
    pub lookup: Arc<StubLookup>,
    pub shutdown: CancellationToken,
}

impl Harness {
    pub fn new(primary: Option<&str>, lookup: Option<&str>) -> Self {
        Self::with_speaker(RecordingSpeaker::default(), primary, lookup)
    }

    pub fn with_speaker(
        speaker: RecordingSpeaker,
        primary: Option<&str>,
        lookup: Option<&str>,
    ) -> Self {
        Self {
            speaker: Arc::new(speaker),
            browser: Arc::new(RecordingBrowser::default()),
            primary: Arc::new(StubPrimary {
                answer: primary.map(|s| s.to_string()),
                ..Default::default()
            }),
            lookup: Arc::new(StubLookup {
                answer: lookup.map(|s| s.to_string()),
                ..Default::default()
            }),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn context(
        &self,
        listener: Arc<dyn Listener>,
        calendar: Arc<dyn CalendarService>,
    ) -> CommandContext {
        CommandContext {
            speaker: self.speaker.clone(),
            listener,
            calendar,
            answers: AnswerResolver::new(self.primary.clone(), self.lookup.clone(), 2),
            browser: self.browser.clone(),
            calendar_url: "https://calendar.google.com".to_string(),
            max_events: 5,
            shutdown: self.shutdown.clone(),
        }
    }
}

/// In-memory token store counting loads and saves
#[derive(Default)]
pub struct MemoryStoreInner {
    pub credential: Mutex<Option<Credential>>,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemoryStore(pub Arc<MemoryStoreInner>);

impl MemoryStore {
    pub fn holding(credential: Credential) -> Self {
        let store = Self::default();
        *store.0.credential.lock().unwrap() = Some(credential);
        store
    }

    pub fn saves(&self) -> usize {
        self.0.saves.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.0.loads.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Credential> {
        self.0.credential.lock().unwrap().clone()
    }
}

impl TokenStore for MemoryStore {
    fn load(&self) -> AssistantResult<Option<Credential>> {
        self.0.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.credential.lock().unwrap().clone())
    }

    fn save(&self, credential: &Credential) -> AssistantResult<()> {
        self.0.saves.fetch_add(1, Ordering::SeqCst);
        *self.0.credential.lock().unwrap() = Some(credential.clone());
        Ok(())
    }
}

/// Refresher stub with a fixed outcome
#[derive(Clone)]
pub struct StubRefresher {
    pub outcome: Result<Credential, RefreshError>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TokenRefresher for StubRefresher {
    async fn refresh(&self, _credential: &Credential) -> Result<Credential, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Consent stub, `None` means no interactive channel
#[derive(Clone)]
pub struct StubConsent {
    pub grant: Option<Credential>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ConsentFlow for StubConsent {
    async fn authorize(&self, _scopes: &[String]) -> AssistantResult<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.grant
            .clone()
            .ok_or_else(|| auth_error("no browser available"))
    }
}

/// Calendar credential expiring at `expiry`
pub fn credential(token: &str, expiry: chrono::DateTime<chrono::Utc>) -> Credential {
    Credential {
        token: token.to_string(),
        refresh_token: Some("refresh-1".to_string()),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        scopes: vec![CALENDAR_READONLY_SCOPE.to_string()],
        expiry: Some(expiry),
    }
}

pub fn calendar_scopes() -> Vec<String> {
    vec![CALENDAR_READONLY_SCOPE.to_string()]
}
