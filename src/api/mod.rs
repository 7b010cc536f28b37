pub mod calendar_api;

pub use calendar_api::GoogleCalendarApi;
