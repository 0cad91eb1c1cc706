use super::models::CalendarEvent;
use rust_i18n::t;

/// Turn upcoming events into lines the assistant can say.
///
/// An empty listing produces the single "no upcoming events" sentence.
pub fn format_events(events: &[CalendarEvent]) -> Vec<String> {
    if events.is_empty() {
        return vec![t!("no_upcoming_events").to_string()];
    }

    events.iter().map(format_event).collect()
}

/// Spoken form of one event: "{summary} at {start}"
pub fn format_event(event: &CalendarEvent) -> String {
    let default_title = t!("event_no_title");
    let summary = event.summary.as_deref().unwrap_or(&default_title);
    let start = event.start().unwrap_or_default();
    t!("event_line", summary = summary, start = start).to_string()
}
