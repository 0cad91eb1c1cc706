use super::{normalize_utterance, split_command, Listener};
use crate::error::{capture_error, AssistantResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

/// Runs an external speech-to-text program and reads the utterance from its stdout
#[derive(Debug, Clone)]
pub struct CommandListener {
    command: String,
}

impl CommandListener {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

#[async_trait]
impl Listener for CommandListener {
    async fn listen(&self) -> AssistantResult<String> {
        let (program, args) = split_command(&self.command)
            .ok_or_else(|| capture_error("Capture command is empty"))?;

        info!("Listening...");
        let output = Command::new(&program)
            .args(&args)
            .output()
            .await
            .map_err(|e| capture_error(&format!("Failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(capture_error(&format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(normalize_utterance(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Typed input fed by the terminal surface
pub struct KeyboardListener {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
    waiting: Arc<AtomicUsize>,
}

/// Sending side of [`KeyboardListener`], owned by the surface
#[derive(Clone)]
pub struct KeyboardFeed {
    tx: mpsc::UnboundedSender<String>,
    waiting: Arc<AtomicUsize>,
}

/// Create a connected keyboard listener and feed
pub fn keyboard() -> (KeyboardListener, KeyboardFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    let waiting = Arc::new(AtomicUsize::new(0));
    (
        KeyboardListener {
            lines: Mutex::new(rx),
            waiting: Arc::clone(&waiting),
        },
        KeyboardFeed { tx, waiting },
    )
}

impl KeyboardFeed {
    /// True while some cycle is waiting for typed input
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst) > 0
    }

    /// Hand a typed line to a waiting cycle
    pub fn offer(&self, line: String) -> bool {
        self.tx.send(line).is_ok()
    }
}

struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Listener for KeyboardListener {
    async fn listen(&self) -> AssistantResult<String> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _guard = WaitingGuard(&self.waiting);

        println!("Listening... type what you would say.");
        let line = self.lines.lock().await.recv().await;
        debug!("Typed input received");

        line.map(|l| normalize_utterance(&l))
            .ok_or_else(|| capture_error("Keyboard input closed"))
    }
}
