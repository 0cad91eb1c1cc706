//! Background dispatch cycles.
//!
//! Each "start" trigger spawns one task that greets, listens, routes and acts.
//! Cycles may overlap; the surface never waits for them.

use crate::commands::{self, route, CommandContext, Intent};
use crate::error::AssistantResult;
use rust_i18n::t;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Spawns and tracks dispatch cycles
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<CommandContext>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(ctx: Arc<CommandContext>) -> Self {
        Self {
            ctx,
            tracker: TaskTracker::new(),
        }
    }

    /// Start one cycle in the background.
    ///
    /// Returns `None` once shutdown has been requested.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.ctx.shutdown.is_cancelled() {
            info!("Shutdown requested, ignoring start trigger");
            return None;
        }

        let ctx = Arc::clone(&self.ctx);
        Some(self.tracker.spawn(async move {
            match run_cycle(&ctx).await {
                Ok(intent) => info!("Dispatch cycle finished: {:?}", intent),
                Err(e) => error!("Dispatch cycle aborted: {}", e),
            }
        }))
    }

    /// Number of cycles still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting cycles and wait up to `grace` for running ones.
    ///
    /// Returns true if every cycle finished in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        let finished = tokio::time::timeout(grace, self.tracker.wait()).await.is_ok();
        if !finished {
            warn!(
                "Abandoning {} dispatch cycles still running",
                self.tracker.len()
            );
        }
        finished
    }
}

/// One greet, capture, route and act pass
pub async fn run_cycle(ctx: &CommandContext) -> AssistantResult<Intent> {
    ctx.say(&t!("greeting")).await?;

    let utterance = match ctx.listener.listen().await {
        Ok(utterance) => utterance,
        Err(e) => {
            // Treated as an empty question
            warn!("Speech capture failed: {}", e);
            String::new()
        }
    };
    info!("You said: {}", utterance);

    let intent = route(&utterance);
    commands::execute(ctx, &intent).await?;

    Ok(intent)
}
