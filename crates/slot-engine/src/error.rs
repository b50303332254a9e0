//! Error types for slot-engine operations.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid calendar event: {0}")]
    InvalidEvent(String),

    /// The calendar collaborator could not be reached. Callers may retry.
    #[error("Calendar source unavailable: {0}")]
    CalendarUnavailable(String),

    /// The requested slot was free when listed but is gone now.
    #[error("Slot {date} {start_time}-{end_time} is no longer available, please choose another")]
    SlotUnavailable {
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    },

    #[error("Booking store error: {0}")]
    Store(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SlotError>;
