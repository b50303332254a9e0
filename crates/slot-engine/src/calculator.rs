//! The slot calculator: availability ranges + busy intervals → bookable slots.
//!
//! Each availability range is walked independently from its start in steps of
//! the policy's slot duration:
//!
//! 1. A candidate `[cursor, cursor + duration)` that would run past the range
//!    end stops the walk. Partial trailing slots are never produced.
//! 2. Candidates starting before `now + min_advance` are skipped.
//! 3. A candidate overlapping a busy interval is rejected and the cursor jumps
//!    to the end of that interval, realigned to a whole minute, so the next
//!    candidate starts exactly when the appointment ends.
//! 4. Anything else is emitted.
//!
//! The result is sorted by `(date, start_time)` in the policy timezone.

use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dst::resolve_local;
use crate::event::NormalizedEvent;
use crate::policy::{AvailabilityMode, WorkingHoursPolicy};

/// A bookable slot.
///
/// `date`, `start_time` and `end_time` are civil values in the policy timezone;
/// `start` and `end` are the absolute instants they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub date: NaiveDate,
    #[serde(with = "crate::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "crate::hhmm")]
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    fn from_instants(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> Self {
        let local_start = start.with_timezone(&tz);
        let local_end = end.with_timezone(&tz);
        Self {
            date: local_start.date_naive(),
            start_time: local_start.time(),
            end_time: local_end.time(),
            duration_minutes: (end - start).num_minutes(),
            start,
            end,
        }
    }
}

/// An interval already taken by an appointment.
#[derive(Debug, Clone, Copy)]
struct BusyInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl BusyInterval {
    /// Half-open overlap against the raw start and the realigned end of the
    /// busy interval.
    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < realign_to_minute(self.end) && end > self.start
    }
}

#[derive(Debug, Default)]
struct WalkStats {
    generated: usize,
    too_soon: usize,
    conflicting: usize,
    out_of_range: usize,
}

/// Round an instant to the nearest whole minute (half a minute rounds up).
///
/// Applied to the cursor after a conflict: a booking ending at 19:00:00.450
/// must let the next slot start at 19:00, not drift onto sub-minute offsets.
pub fn realign_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_round(Duration::minutes(1))
        .unwrap_or(instant)
}

/// Compute the bookable slots between two civil dates (inclusive).
///
/// `events` is unordered; events classified as available open the ranges to
/// walk (in [`AvailabilityMode::Declared`]) and every other event is busy. In
/// [`AvailabilityMode::WorkingHours`] the ranges come from
/// [`working_hours_ranges`] instead.
///
/// Only slots whose civil date lies in `range_start..=range_end` are returned.
/// Malformed input (empty or inverted ranges, overlapping busy intervals)
/// degrades to fewer slots; this function never fails.
pub fn calculate_available_slots(
    range_start: NaiveDate,
    range_end: NaiveDate,
    events: &[NormalizedEvent],
    policy: &WorkingHoursPolicy,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let (declared, booked): (Vec<&NormalizedEvent>, Vec<&NormalizedEvent>) =
        events.iter().partition(|e| e.is_available());

    let ranges: Vec<(DateTime<Utc>, DateTime<Utc>)> = match policy.mode() {
        AvailabilityMode::Declared => declared.iter().map(|e| (e.start, e.end)).collect(),
        AvailabilityMode::WorkingHours => working_hours_ranges(range_start, range_end, policy),
    };

    // Sorted so "first conflicting interval" does not depend on input order.
    let mut busy: Vec<BusyInterval> = booked
        .iter()
        .filter(|e| e.start < e.end)
        .map(|e| BusyInterval {
            start: e.start,
            end: e.end,
        })
        .collect();
    busy.sort_by_key(|b| (b.start, b.end));

    let threshold = policy.booking_threshold(now);
    let mut stats = WalkStats::default();
    let mut slots = Vec::new();

    for &(start, end) in &ranges {
        walk_range(
            start,
            end,
            &busy,
            policy,
            threshold,
            (range_start, range_end),
            &mut stats,
            &mut slots,
        );
    }

    slots.sort_by_key(|s| (s.date, s.start_time, s.start));
    slots.dedup();

    debug!(
        %range_start,
        %range_end,
        ranges = ranges.len(),
        busy = busy.len(),
        generated = stats.generated,
        too_soon = stats.too_soon,
        conflicting = stats.conflicting,
        out_of_range = stats.out_of_range,
        emitted = slots.len(),
        "calculated available slots"
    );

    slots
}

#[allow(clippy::too_many_arguments)]
fn walk_range(
    range_open: DateTime<Utc>,
    range_close: DateTime<Utc>,
    busy: &[BusyInterval],
    policy: &WorkingHoursPolicy,
    threshold: DateTime<Utc>,
    (first_date, last_date): (NaiveDate, NaiveDate),
    stats: &mut WalkStats,
    slots: &mut Vec<Slot>,
) {
    let step = policy.slot_duration();
    let mut cursor = range_open;

    while let Some(slot_end) = cursor
        .checked_add_signed(step)
        .filter(|end| *end <= range_close)
    {
        stats.generated += 1;

        if cursor < threshold {
            stats.too_soon += 1;
            cursor = slot_end;
            continue;
        }

        match busy.iter().find(|b| b.overlaps(cursor, slot_end)) {
            Some(conflict) => {
                stats.conflicting += 1;
                // Realign cursor to whole-minute boundary after a conflict.
                cursor = realign_to_minute(conflict.end);
            }
            None => {
                let slot = Slot::from_instants(cursor, slot_end, policy.timezone());
                if slot.date < first_date || slot.date > last_date {
                    stats.out_of_range += 1;
                } else {
                    slots.push(slot);
                }
                cursor = slot_end;
            }
        }
    }
}

/// Availability ranges synthesised from the policy's working days and daily
/// window, one per working day in `range_start..=range_end`.
///
/// Bounds are resolved in the policy timezone; a bound inside a DST gap follows
/// the policy's [`DstPolicy`](crate::dst::DstPolicy), and a day whose bound is
/// skipped contributes nothing.
pub fn working_hours_ranges(
    range_start: NaiveDate,
    range_end: NaiveDate,
    policy: &WorkingHoursPolicy,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let tz = policy.timezone();
    let mut ranges = Vec::new();
    let mut day = Some(range_start);

    while let Some(date) = day.filter(|d| *d <= range_end) {
        if policy.is_working_day(date) {
            let open = resolve_local(tz, date.and_time(policy.day_start()), policy.dst_gap());
            let close = resolve_local(tz, date.and_time(policy.day_end()), policy.dst_gap());
            if let (Some(open), Some(close)) = (open, close) {
                if open < close {
                    ranges.push((open.with_timezone(&Utc), close.with_timezone(&Utc)));
                }
            }
        }
        day = date.succ_opt();
    }

    ranges
}
