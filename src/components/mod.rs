// Export components
pub mod answers;
pub mod google_calendar;
pub mod voice;

// Re-export Google Calendar handle
pub use google_calendar::GoogleCalendarHandle;
