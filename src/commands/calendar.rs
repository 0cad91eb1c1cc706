use crate::commands::{CommandContext, CommandResult};
use crate::components::google_calendar::format_events;
use crate::error::Error;
use rust_i18n::t;
use tracing::{error, info};

/// Read out the next upcoming events
pub async fn get_events(ctx: &CommandContext) -> CommandResult {
    // Announce only once the calendar is reachable
    match ctx.calendar.authorize().await {
        Ok(()) => {}
        Err(Error::Auth(reason)) => {
            error!("Calendar authorization failed: {}", reason);
            return ctx.say(&t!("calendar_auth_failed")).await;
        }
        Err(e) => {
            error!("Calendar unavailable: {}", e);
            return ctx.say(&t!("calendar_fetch_failed")).await;
        }
    }

    ctx.say(&t!("fetch_processing")).await?;

    let events = match ctx.calendar.upcoming_events(ctx.max_events).await {
        Ok(events) => events,
        Err(Error::Auth(reason)) => {
            error!("Calendar authorization failed: {}", reason);
            return ctx.say(&t!("calendar_auth_failed")).await;
        }
        Err(e) => {
            error!("Failed to fetch calendar events: {}", e);
            return ctx.say(&t!("calendar_fetch_failed")).await;
        }
    };

    info!("Read {} upcoming events", events.len());
    for line in format_events(&events) {
        ctx.say(&line).await?;
    }

    Ok(())
}

/// Announce and open the calendar page
pub async fn open_calendar(ctx: &CommandContext) -> CommandResult {
    ctx.say(&t!("opening_calendar")).await?;
    ctx.browser.open(&ctx.calendar_url);
    Ok(())
}
