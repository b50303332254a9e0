//! # slot-engine
//!
//! Deterministic bookable-slot calculation for a single practitioner's calendar.
//!
//! The engine turns declared availability ranges and already-booked appointments
//! into a chronologically sorted list of fixed-duration slots. All wall-clock
//! reasoning happens in the policy's IANA timezone via `chrono-tz`, never in the
//! host's local zone, so the same inputs yield the same slots anywhere.
//!
//! ## Modules
//!
//! - [`policy`] — Working-hours policy (timezone, working days, slot size, notice, horizon)
//! - [`dst`] — Resolution of wall-clock times that fall in DST gaps or overlaps
//! - [`event`] — Raw calendar events → normalized, classified intervals
//! - [`calculator`] — The slot walk: past-time filter, overlap filter, realignment
//! - [`grouping`] — Group slots by date, next slot, slot membership
//! - [`booking`] — Re-validate-before-commit booking flow over calendar/store collaborators
//! - [`error`] — Error types

pub mod booking;
pub mod calculator;
pub mod dst;
pub mod error;
pub mod event;
pub mod grouping;
mod hhmm;
pub mod policy;

pub use booking::{BookingDesk, BookingStore, CalendarSource, SlotRequest};
pub use calculator::{calculate_available_slots, realign_to_minute, working_hours_ranges, Slot};
pub use dst::DstPolicy;
pub use error::SlotError;
pub use event::{
    classify_summary, normalize_event, normalize_events, parse_calendar_json, EventKind, EventTime,
    NormalizedEvent, RawCalendarEvent,
};
pub use grouping::{available_dates, group_slots_by_date, is_slot_available, next_available_slot};
pub use policy::{AvailabilityMode, PolicyConfig, WorkingHoursPolicy};
