use crate::error::{config_error, AssistantResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default OpenAI model used for general questions
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
/// Default Wikipedia action API endpoint
pub const DEFAULT_WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
/// Default calendar page opened by the "open calendar" command
pub const DEFAULT_CALENDAR_URL: &str = "https://calendar.google.com";
/// Path of the optional TOML overlay
pub const OVERLAY_PATH: &str = "config/assistant.toml";

/// Main configuration structure for the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAI API key, the primary answer service is skipped without one
    pub openai_api_key: Option<String>,
    /// OpenAI chat model
    pub openai_model: String,
    /// OpenAI API base URL (including `/v1`)
    pub openai_api_url: String,
    /// Wikipedia action API endpoint
    pub wikipedia_api_url: String,
    /// Number of sentences requested from Wikipedia
    pub answer_sentences: u32,
    /// Google OAuth client secrets file
    pub google_credentials_file: PathBuf,
    /// Durable token store
    pub google_token_file: PathBuf,
    /// Calendar listed by "get events"
    pub google_calendar_id: String,
    /// Maximum number of events read out
    pub calendar_max_events: u32,
    /// Page opened by "open calendar"
    pub calendar_url: String,
    /// Browser program, the system default is used when unset
    pub browser_command: Option<String>,
    /// Speech-to-text command, typed input is used when unset
    pub capture_command: Option<String>,
    /// Text-to-speech command, output goes to the console only when unset
    pub speak_command: Option<String>,
    /// Locale for spoken phrases
    pub locale: String,
}

/// Values read from `config/assistant.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverlay {
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_api_url: Option<String>,
    pub wikipedia_api_url: Option<String>,
    pub answer_sentences: Option<u32>,
    pub google_credentials_file: Option<PathBuf>,
    pub google_token_file: Option<PathBuf>,
    pub google_calendar_id: Option<String>,
    pub calendar_max_events: Option<u32>,
    pub calendar_url: Option<String>,
    pub browser_command: Option<String>,
    pub capture_command: Option<String>,
    pub speak_command: Option<String>,
    pub locale: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            wikipedia_api_url: DEFAULT_WIKIPEDIA_API_URL.to_string(),
            answer_sentences: 2,
            google_credentials_file: PathBuf::from("credentials.json"),
            google_token_file: PathBuf::from("token.json"),
            google_calendar_id: "primary".to_string(),
            calendar_max_events: 5,
            calendar_url: DEFAULT_CALENDAR_URL.to_string(),
            browser_command: None,
            capture_command: None,
            speak_command: None,
            locale: "en".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AssistantResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let overlay = ConfigOverlay::load(Path::new(OVERLAY_PATH))?;
        Self::from_sources(|key| env::var(key).ok(), overlay)
    }

    /// Build a config from a variable lookup and an overlay.
    ///
    /// Variables win over the overlay, the overlay wins over defaults.
    pub fn from_sources<F>(lookup: F, overlay: ConfigOverlay) -> AssistantResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let answer_sentences = match var("ANSWER_SENTENCES") {
            Some(raw) => parse_number("ANSWER_SENTENCES", &raw)?,
            None => overlay.answer_sentences.unwrap_or(defaults.answer_sentences),
        };

        let calendar_max_events = match var("CALENDAR_MAX_EVENTS") {
            Some(raw) => parse_number("CALENDAR_MAX_EVENTS", &raw)?,
            None => overlay
                .calendar_max_events
                .unwrap_or(defaults.calendar_max_events),
        };

        if calendar_max_events == 0 {
            return Err(config_error("CALENDAR_MAX_EVENTS must be at least 1"));
        }

        Ok(Config {
            openai_api_key: var("OPENAI_API_KEY").or(overlay.openai_api_key),
            openai_model: var("OPENAI_MODEL")
                .or(overlay.openai_model)
                .unwrap_or(defaults.openai_model),
            openai_api_url: var("OPENAI_API_URL")
                .or(overlay.openai_api_url)
                .unwrap_or(defaults.openai_api_url),
            wikipedia_api_url: var("WIKIPEDIA_API_URL")
                .or(overlay.wikipedia_api_url)
                .unwrap_or(defaults.wikipedia_api_url),
            answer_sentences,
            google_credentials_file: var("GOOGLE_CREDENTIALS_FILE")
                .map(PathBuf::from)
                .or(overlay.google_credentials_file)
                .unwrap_or(defaults.google_credentials_file),
            google_token_file: var("GOOGLE_TOKEN_FILE")
                .map(PathBuf::from)
                .or(overlay.google_token_file)
                .unwrap_or(defaults.google_token_file),
            google_calendar_id: var("GOOGLE_CALENDAR_ID")
                .or(overlay.google_calendar_id)
                .unwrap_or(defaults.google_calendar_id),
            calendar_max_events,
            calendar_url: var("CALENDAR_URL")
                .or(overlay.calendar_url)
                .unwrap_or(defaults.calendar_url),
            browser_command: var("BROWSER_COMMAND").or(overlay.browser_command),
            capture_command: var("CAPTURE_COMMAND").or(overlay.capture_command),
            speak_command: var("SPEAK_COMMAND").or(overlay.speak_command),
            locale: var("ASSISTANT_LOCALE")
                .or(overlay.locale)
                .unwrap_or(defaults.locale),
        })
    }
}

impl ConfigOverlay {
    /// Read the overlay file, a missing file is an empty overlay
    pub fn load(path: &Path) -> AssistantResult<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

fn parse_number(key: &str, raw: &str) -> AssistantResult<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| config_error(&format!("Invalid {} format: {}", key, raw)))
}
