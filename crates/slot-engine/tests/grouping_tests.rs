//! Tests for slot grouping and lookup helpers.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use slot_engine::grouping::{
    available_dates, group_slots_by_date, is_slot_available, next_available_slot,
};
use slot_engine::{Slot, SlotRequest};

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// A one-hour UTC slot; the helpers only look at the civil fields.
fn slot(day: &str, start: &str) -> Slot {
    let date = date(day);
    let start_time = time(start);
    let end_time = start_time + chrono::Duration::hours(1);
    let start = Utc.from_utc_datetime(&date.and_time(start_time));
    Slot {
        date,
        start_time,
        end_time,
        duration_minutes: 60,
        start,
        end: start + chrono::Duration::hours(1),
    }
}

#[test]
fn groups_slots_per_day_in_order() {
    let slots = vec![
        slot("2026-01-12", "09:00"),
        slot("2026-01-12", "10:00"),
        slot("2026-01-14", "15:00"),
    ];

    let grouped = group_slots_by_date(&slots);

    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[&date("2026-01-12")].len(), 2);
    assert_eq!(grouped[&date("2026-01-12")][1].start_time, time("10:00"));
    assert_eq!(grouped[&date("2026-01-14")].len(), 1);
    assert!(!grouped.contains_key(&date("2026-01-13")));
}

#[test]
fn grouping_empty_list_is_empty() {
    assert!(group_slots_by_date(&[]).is_empty());
    assert!(available_dates(&[]).is_empty());
    assert!(next_available_slot(&[]).is_none());
}

#[test]
fn available_dates_sorted_and_unique() {
    let slots = vec![
        slot("2026-01-14", "09:00"),
        slot("2026-01-12", "09:00"),
        slot("2026-01-14", "10:00"),
        slot("2026-01-12", "11:00"),
    ];

    assert_eq!(
        available_dates(&slots),
        vec![date("2026-01-12"), date("2026-01-14")]
    );
}

#[test]
fn next_available_slot_ignores_input_order() {
    let slots = vec![
        slot("2026-01-14", "09:00"),
        slot("2026-01-12", "15:00"),
        slot("2026-01-12", "11:00"),
    ];

    let next = next_available_slot(&slots).unwrap();

    assert_eq!(next.date, date("2026-01-12"));
    assert_eq!(next.start_time, time("11:00"));
}

#[test]
fn slot_membership_requires_exact_match() {
    let slots = vec![slot("2026-01-12", "09:00"), slot("2026-01-12", "10:00")];

    let exact = SlotRequest::new(date("2026-01-12"), time("10:00"), time("11:00"));
    let wrong_end = SlotRequest::new(date("2026-01-12"), time("10:00"), time("10:30"));
    let wrong_day = SlotRequest::new(date("2026-01-13"), time("10:00"), time("11:00"));
    let shifted = SlotRequest::new(date("2026-01-12"), time("09:30"), time("10:30"));

    assert!(is_slot_available(&slots, &exact));
    assert!(!is_slot_available(&slots, &wrong_end));
    assert!(!is_slot_available(&slots, &wrong_day));
    assert!(!is_slot_available(&slots, &shifted));
}

#[test]
fn slot_request_reads_hours_and_minutes() {
    let request: SlotRequest =
        serde_json::from_str(r#"{"date":"2026-01-12","startTime":"19:00","endTime":"20:00"}"#)
            .unwrap();

    assert_eq!(
        request,
        SlotRequest::new(date("2026-01-12"), time("19:00"), time("20:00"))
    );
}
