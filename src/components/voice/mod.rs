//! Speech input, speech output and the browser launcher.

mod browser;
mod capture;
mod speech;

pub use browser::SystemBrowser;
pub use capture::{keyboard, CommandListener, KeyboardFeed, KeyboardListener};
pub use speech::CommandSpeaker;

use crate::error::AssistantResult;
use async_trait::async_trait;

/// Produces one utterance per call
#[async_trait]
pub trait Listener: Send + Sync {
    /// Wait for the next utterance, already lower-cased
    async fn listen(&self) -> AssistantResult<String>;
}

/// Says text out loud
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> AssistantResult<()>;
}

/// Opens a page for the user, fire-and-forget
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str);
}

/// Split a configured command line into program and arguments
pub(crate) fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(|s| s.to_string());
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Normalise recognised speech the way the router expects it
pub fn normalize_utterance(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utterances_are_trimmed_and_lowercased() {
        assert_eq!(normalize_utterance("  Get Events\n"), "get events");
        assert_eq!(normalize_utterance(""), "");
    }

    #[test]
    fn commands_split_on_whitespace() {
        let (program, args) = split_command("espeak -v en").unwrap();
        assert_eq!(program, "espeak");
        assert_eq!(args, vec!["-v", "en"]);
        assert!(split_command("   ").is_none());
    }
}
