//! Helpers over a computed slot list.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::booking::SlotRequest;
use crate::calculator::Slot;

/// Group slots by civil date, keeping each day's slots in input order.
pub fn group_slots_by_date(slots: &[Slot]) -> BTreeMap<NaiveDate, Vec<Slot>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<Slot>> = BTreeMap::new();
    for slot in slots {
        grouped.entry(slot.date).or_default().push(slot.clone());
    }
    grouped
}

/// Dates that have at least one slot, ascending.
pub fn available_dates(slots: &[Slot]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Whether `request` names exactly one of `slots` (date, start and end all match).
pub fn is_slot_available(slots: &[Slot], request: &SlotRequest) -> bool {
    slots.iter().any(|slot| request.matches(slot))
}

/// The earliest slot by `(date, start_time)`, whatever the input order.
pub fn next_available_slot(slots: &[Slot]) -> Option<&Slot> {
    slots.iter().min_by_key(|s| (s.date, s.start_time, s.start))
}
