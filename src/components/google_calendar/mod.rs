mod actor;
pub mod consent;
pub mod format;
mod handle;
pub mod models;
pub mod token;

pub use actor::{fetch_events, EventQuery, DEFAULT_API_BASE};
pub use format::{format_event, format_events};
pub use handle::GoogleCalendarHandle;
pub use models::CalendarEvent;

use crate::error::AssistantResult;
use async_trait::async_trait;

/// Source of upcoming calendar events
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Make sure a usable credential exists, asking for consent if needed
    async fn authorize(&self) -> AssistantResult<()>;

    /// Up to `max_results` events starting from now, ordered by start time
    async fn upcoming_events(&self, max_results: u32) -> AssistantResult<Vec<CalendarEvent>>;
}
