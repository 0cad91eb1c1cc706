use serde_json::Value;

/// Simplified calendar event representation
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, Default)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub start_date_time: Option<String>,
    pub start_date: Option<String>,
}

impl CalendarEvent {
    /// Start moment as reported by the provider, the timed instant wins over the date
    pub fn start(&self) -> Option<&str> {
        self.start_date_time
            .as_deref()
            .or(self.start_date.as_deref())
    }

    /// Build an event from one entry of the `items` array of an events listing
    pub fn from_api(event: &Value) -> Self {
        let id = event.get("id").and_then(|id| id.as_str()).unwrap_or("").to_string();
        let summary = event.get("summary").and_then(|s| s.as_str()).map(|s| s.to_string());

        let start = event.get("start").and_then(|start| start.as_object());

        let start_date_time = start
            .and_then(|start| start.get("dateTime"))
            .and_then(|dt| dt.as_str())
            .map(|s| s.to_string());

        let start_date = start
            .and_then(|start| start.get("date"))
            .and_then(|d| d.as_str())
            .map(|s| s.to_string());

        CalendarEvent {
            id,
            summary,
            start_date_time,
            start_date,
        }
    }
}
