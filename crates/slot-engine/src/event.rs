//! Normalization boundary between the external calendar and the engine.
//!
//! The calendar collaborator hands over Google-Calendar-shaped events whose
//! timestamps are ISO 8601 strings with offsets. They become
//! [`NormalizedEvent`]s: absolute UTC instants plus an explicit [`EventKind`].
//! The only place that looks at the free-text title is [`classify_summary`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dst::{resolve_local, DstPolicy};
use crate::error::{Result, SlotError};
use crate::policy::WorkingHoursPolicy;

/// Title token that marks an event as declared availability.
pub const AVAILABLE_MARKER: &str = "DISPONIBLE";

/// Whether an event opens bookable time or consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Available,
    Busy,
}

/// Classify an event by its title.
///
/// Legacy compatibility with the external calendar's naming convention: any
/// title containing [`AVAILABLE_MARKER`], in any letter case, is availability
/// ("🟢 Disponible - consultations" included). Everything else is busy.
pub fn classify_summary(summary: &str) -> EventKind {
    if summary.to_uppercase().contains(AVAILABLE_MARKER) {
        EventKind::Available
    } else {
        EventKind::Busy
    }
}

/// One side of a calendar event: either a timed instant or an all-day date.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// A timed value such as `"2026-01-10T09:00:00+01:00"`.
    pub fn date_time(value: impl Into<String>) -> Self {
        Self {
            date_time: Some(value.into()),
            ..Self::default()
        }
    }

    /// An all-day value such as `"2026-01-10"`.
    pub fn all_day(value: impl Into<String>) -> Self {
        Self {
            date: Some(value.into()),
            ..Self::default()
        }
    }
}

/// An event as delivered by the calendar collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RawCalendarEvent {
    fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }
}

/// An event reduced to what the calculator needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    pub kind: EventKind,
}

impl NormalizedEvent {
    /// Build an event, classifying it from its summary.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        let kind = classify_summary(&summary);
        Self {
            start,
            end,
            summary,
            kind,
        }
    }

    /// Build an event whose kind is already known (e.g., a committed booking).
    pub fn with_kind(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        summary: impl Into<String>,
        kind: EventKind,
    ) -> Self {
        Self {
            start,
            end,
            summary: summary.into(),
            kind,
        }
    }

    pub fn is_available(&self) -> bool {
        self.kind == EventKind::Available
    }
}

/// Convert one raw calendar event into a normalized one.
///
/// Timed values are parsed as RFC 3339 instants, offset included. A timed value
/// without an offset is read in the event's own `timeZone`, or in `tz` if it has
/// none. All-day values start at local midnight of their date in `tz`.
///
/// # Errors
/// Returns `SlotError::InvalidEvent` when a side has neither `dateTime` nor
/// `date`, or when either cannot be parsed.
pub fn normalize_event(raw: &RawCalendarEvent, tz: Tz, dst: DstPolicy) -> Result<NormalizedEvent> {
    let start = resolve_event_time(&raw.start, tz, dst, "start")?;
    let end = resolve_event_time(&raw.end, tz, dst, "end")?;
    let summary = raw.summary.clone().unwrap_or_default();
    Ok(NormalizedEvent::new(start, end, summary))
}

/// Normalize a batch of raw events under `policy`, dropping cancelled ones.
pub fn normalize_events(
    raws: &[RawCalendarEvent],
    policy: &WorkingHoursPolicy,
) -> Result<Vec<NormalizedEvent>> {
    let events: Vec<NormalizedEvent> = raws
        .iter()
        .filter(|raw| !raw.is_cancelled())
        .map(|raw| normalize_event(raw, policy.timezone(), policy.dst_gap()))
        .collect::<Result<_>>()?;

    debug!(
        received = raws.len(),
        kept = events.len(),
        available = events.iter().filter(|e| e.is_available()).count(),
        "normalized calendar events"
    );

    Ok(events)
}

/// Calendar payload shapes accepted by [`parse_calendar_json`].
#[derive(Deserialize)]
#[serde(untagged)]
enum CalendarPayload {
    List(Vec<RawCalendarEvent>),
    Page { items: Vec<RawCalendarEvent> },
}

/// Parse a calendar payload: either a bare JSON array of events or a list
/// response object with an `items` array.
pub fn parse_calendar_json(json: &str) -> Result<Vec<RawCalendarEvent>> {
    let payload: CalendarPayload = serde_json::from_str(json)?;
    Ok(match payload {
        CalendarPayload::List(events) => events,
        CalendarPayload::Page { items } => items,
    })
}

fn resolve_event_time(
    time: &EventTime,
    tz: Tz,
    dst: DstPolicy,
    side: &str,
) -> Result<DateTime<Utc>> {
    if let Some(raw) = time.date_time.as_deref() {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .map_err(|e| SlotError::InvalidEvent(format!("{} '{}': {}", side, raw, e)))?;
        let zone = match time.time_zone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| SlotError::InvalidTimezone(name.to_string()))?,
            None => tz,
        };
        return resolve_local(zone, naive, dst)
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                SlotError::InvalidEvent(format!("{} '{}' does not exist in {}", side, raw, zone))
            });
    }

    if let Some(raw) = time.date.as_deref() {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| SlotError::InvalidEvent(format!("{} '{}': {}", side, raw, e)))?;
        return resolve_local(tz, date.and_time(chrono::NaiveTime::MIN), DstPolicy::ShiftForward)
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                SlotError::InvalidEvent(format!("{} '{}' has no midnight in {}", side, raw, tz))
            });
    }

    Err(SlotError::InvalidEvent(format!(
        "{} has neither dateTime nor date",
        side
    )))
}
