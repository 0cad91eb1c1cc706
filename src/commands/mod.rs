use crate::components::answers::AnswerResolver;
use crate::components::google_calendar::CalendarService;
use crate::components::voice::{BrowserLauncher, Listener, Speaker};
use crate::error::AssistantResult;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

// Export submodules
pub mod calendar;
pub mod general;
pub mod util;

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    FetchEvents,
    OpenCalendar,
    Exit,
    /// Anything else, carrying the full utterance as the question
    GeneralQuestion(String),
}

/// Trigger phrases in priority order, the first rule with a matching phrase wins
pub const INTENT_RULES: &[(&[&str], Intent)] = &[
    (&["get events"], Intent::FetchEvents),
    (&["open calendar"], Intent::OpenCalendar),
    (&["exit", "quit"], Intent::Exit),
];

/// Classify a normalised utterance. Every input maps to exactly one intent.
pub fn route(utterance: &str) -> Intent {
    INTENT_RULES
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|phrase| utterance.contains(phrase)))
        .map(|(_, intent)| intent.clone())
        .unwrap_or_else(|| Intent::GeneralQuestion(utterance.to_string()))
}

/// Collaborators shared by every dispatch cycle
pub struct CommandContext {
    pub speaker: Arc<dyn Speaker>,
    pub listener: Arc<dyn Listener>,
    pub calendar: Arc<dyn CalendarService>,
    pub answers: AnswerResolver,
    pub browser: Arc<dyn BrowserLauncher>,
    /// Page opened by "open calendar"
    pub calendar_url: String,
    /// Number of events read out by "get events"
    pub max_events: u32,
    /// Cancelled when the assistant should stop
    pub shutdown: CancellationToken,
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("calendar_url", &self.calendar_url)
            .field("max_events", &self.max_events)
            .field("shutdown_requested", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl CommandContext {
    /// Say one line
    pub async fn say(&self, text: &str) -> AssistantResult<()> {
        self.speaker.speak(text).await
    }
}

/// Type alias for command result.
///
/// Only speech output failures come back as errors, everything else is spoken.
pub type CommandResult = AssistantResult<()>;

/// Run the handler for `intent`
pub async fn execute(ctx: &CommandContext, intent: &Intent) -> CommandResult {
    debug!("Executing intent {:?}", intent);
    match intent {
        Intent::FetchEvents => calendar::get_events(ctx).await,
        Intent::OpenCalendar => calendar::open_calendar(ctx).await,
        Intent::Exit => util::exit(ctx).await,
        Intent::GeneralQuestion(query) => general::answer_question(ctx, query).await,
    }
}
