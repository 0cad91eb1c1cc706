//! Terminal front end: Enter (or `start`) begins a cycle, `quit` stops the assistant.

use crate::components::voice::KeyboardFeed;
use crate::dispatch::Dispatcher;
use crate::error::AssistantResult;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Something the user asked the surface to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Terminate,
}

/// Map a typed line to a trigger
pub fn parse_trigger(line: &str) -> Option<Trigger> {
    match line.trim().to_lowercase().as_str() {
        "" | "s" | "start" => Some(Trigger::Start),
        "q" | "quit" | "exit" => Some(Trigger::Terminate),
        _ => None,
    }
}

/// Foreground loop. It only reads lines and spawns cycles, so it never blocks on them.
pub struct TerminalSurface {
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
    keyboard: Option<KeyboardFeed>,
}

impl TerminalSurface {
    pub fn new(
        dispatcher: Dispatcher,
        shutdown: CancellationToken,
        keyboard: Option<KeyboardFeed>,
    ) -> Self {
        Self {
            dispatcher,
            shutdown,
            keyboard,
        }
    }

    /// Run until terminated, asked to exit, or input ends
    pub async fn run<R>(&self, input: R) -> AssistantResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        println!("Press Enter to start listening, type 'quit' to exit.");

        loop {
            let line = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Surface closing");
                    break;
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                info!("Input closed");
                self.shutdown.cancel();
                break;
            };

            // Typed utterances go to the waiting cycle first
            if let Some(keyboard) = &self.keyboard {
                if keyboard.is_waiting() {
                    keyboard.offer(line);
                    continue;
                }
            }

            match parse_trigger(&line) {
                Some(Trigger::Start) => {
                    let _ = self.dispatcher.start();
                    debug!("{} cycles in flight", self.dispatcher.in_flight());
                }
                Some(Trigger::Terminate) => {
                    info!("Terminate requested");
                    self.shutdown.cancel();
                    break;
                }
                None => println!("Press Enter to start listening, type 'quit' to exit."),
            }
        }

        Ok(())
    }
}
