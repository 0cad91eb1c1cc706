use super::{split_command, Speaker};
use crate::error::{speech_error, AssistantResult};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

/// Prints every line and optionally plays it through a text-to-speech program.
///
/// Lines are spoken one at a time even when several cycles run at once.
#[derive(Debug, Default)]
pub struct CommandSpeaker {
    command: Option<String>,
    playback: Mutex<()>,
}

impl CommandSpeaker {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command,
            playback: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str) -> AssistantResult<()> {
        let _playback = self.playback.lock().await;

        debug!("Speaking {} characters", text.len());
        println!("Assistant: {}", text);

        let Some((program, args)) = self.command.as_deref().and_then(split_command) else {
            return Ok(());
        };

        let status = Command::new(&program)
            .args(&args)
            .arg(text)
            .status()
            .await
            .map_err(|e| speech_error(&format!("Failed to run {}: {}", program, e)))?;

        if !status.success() {
            return Err(speech_error(&format!("{} exited with {}", program, status)));
        }

        Ok(())
    }
}
