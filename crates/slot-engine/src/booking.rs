//! Booking flow around the calculator: list slots, then re-validate before commit.
//!
//! Between showing slots and confirming one, another booking may land. The
//! [`BookingDesk`] therefore recomputes the requested day from freshly fetched
//! calendar events and committed bookings right before writing, and refuses
//! with [`SlotError::SlotUnavailable`] if the slot is gone.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculator::{calculate_available_slots, Slot};
use crate::error::{Result, SlotError};
use crate::event::{normalize_events, EventKind, NormalizedEvent, RawCalendarEvent};
use crate::grouping::is_slot_available;
use crate::policy::WorkingHoursPolicy;

/// A slot as chosen by a client: civil date and wall-clock bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub date: NaiveDate,
    #[serde(with = "crate::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "crate::hhmm")]
    pub end_time: NaiveTime,
}

impl SlotRequest {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
        }
    }

    /// Whether `slot` is the one requested.
    pub fn matches(&self, slot: &Slot) -> bool {
        slot.date == self.date && slot.start_time == self.start_time && slot.end_time == self.end_time
    }
}

/// Source of calendar events (availability declarations and appointments).
pub trait CalendarSource {
    /// Events overlapping the civil dates `from..=to`.
    ///
    /// Failures should surface as `SlotError::CalendarUnavailable`.
    fn events(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<RawCalendarEvent>>;
}

/// Persistence of confirmed appointments.
pub trait BookingStore {
    /// Committed bookings overlapping `from..=to`. Their kind is ignored: all
    /// of them are treated as busy.
    fn busy_intervals(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NormalizedEvent>>;

    /// Persist a booking for `slot`.
    fn commit(&self, slot: &Slot) -> Result<()>;
}

/// Ties a policy to its calendar and booking collaborators.
pub struct BookingDesk<C, S> {
    policy: WorkingHoursPolicy,
    calendar: C,
    store: S,
}

impl<C: CalendarSource, S: BookingStore> BookingDesk<C, S> {
    pub fn new(policy: WorkingHoursPolicy, calendar: C, store: S) -> Self {
        Self {
            policy,
            calendar,
            store,
        }
    }

    pub fn policy(&self) -> &WorkingHoursPolicy {
        &self.policy
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bookable slots between `from` and `to`, restricted to the booking horizon.
    ///
    /// A request entirely outside `[today, today + max_advance_days]` yields an
    /// empty list.
    pub fn available_slots(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        let Some((from, to)) = self.policy.clamp_query(from, to, now) else {
            debug!(%from, %to, "query outside booking horizon");
            return Ok(Vec::new());
        };

        let events = self.fetch_events(from, to)?;
        Ok(calculate_available_slots(from, to, &events, &self.policy, now))
    }

    /// Whether `request` is bookable right now, from fresh data.
    pub fn check_slot(&self, request: &SlotRequest, now: DateTime<Utc>) -> Result<bool> {
        let slots = self.available_slots(request.date, request.date, now)?;
        Ok(is_slot_available(&slots, request))
    }

    /// Book `request` after re-validating it against fresh data.
    ///
    /// # Errors
    /// Returns `SlotError::SlotUnavailable` when the slot is no longer free,
    /// and propagates collaborator failures unchanged. Nothing is written in
    /// either case.
    pub fn book(&self, request: &SlotRequest, now: DateTime<Utc>) -> Result<Slot> {
        let slots = self.available_slots(request.date, request.date, now)?;

        let Some(slot) = slots.into_iter().find(|slot| request.matches(slot)) else {
            warn!(
                date = %request.date,
                start = %request.start_time.format("%H:%M"),
                "requested slot no longer available"
            );
            return Err(SlotError::SlotUnavailable {
                date: request.date,
                start_time: request.start_time,
                end_time: request.end_time,
            });
        };

        self.store.commit(&slot)?;
        info!(date = %slot.date, start = %slot.start, end = %slot.end, "slot booked");
        Ok(slot)
    }

    fn fetch_events(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NormalizedEvent>> {
        let raw = self.calendar.events(from, to)?;
        let mut events = normalize_events(&raw, &self.policy)?;

        events.extend(
            self.store
                .busy_intervals(from, to)?
                .into_iter()
                .map(|b| NormalizedEvent::with_kind(b.start, b.end, b.summary, EventKind::Busy)),
        );

        Ok(events)
    }
}
