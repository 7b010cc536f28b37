pub mod calendar;
pub mod message;
