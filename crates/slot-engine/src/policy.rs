//! Working-hours policy: the immutable configuration read by the slot calculator.
//!
//! A [`PolicyConfig`] is the raw, deserializable form (a JSON file, a literal in
//! tests). [`WorkingHoursPolicy::new`] validates it once; afterwards the policy is
//! read-only and cheap to share between concurrent calculations.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, SlotError};

/// Where availability ranges come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityMode {
    /// Only events tagged as available open bookable time.
    #[default]
    Declared,
    /// Every working day's `day_start..day_end` window is open; declared
    /// availability is ignored and every other event is busy.
    WorkingHours,
}

/// Raw policy configuration, as read from JSON.
///
/// Missing fields fall back to [`PolicyConfig::clinic_default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// IANA timezone (e.g., "Europe/Paris").
    pub timezone: String,
    /// ISO weekday numbers, 1 = Monday .. 7 = Sunday.
    pub working_days: Vec<u32>,
    #[serde(with = "crate::hhmm")]
    pub day_start: NaiveTime,
    #[serde(with = "crate::hhmm")]
    pub day_end: NaiveTime,
    pub slot_duration_minutes: i64,
    pub min_advance_minutes: i64,
    pub max_advance_days: i64,
    pub dst_gap: DstPolicy,
    pub mode: AvailabilityMode,
}

impl PolicyConfig {
    /// The practice's standard hours: Paris time, Monday to Friday, 09:00-18:00,
    /// one-hour slots booked at least two hours ahead and at most 30 days out.
    pub fn clinic_default() -> Self {
        Self {
            timezone: "Europe/Paris".to_string(),
            working_days: vec![1, 2, 3, 4, 5],
            day_start: on_the_hour(9),
            day_end: on_the_hour(18),
            slot_duration_minutes: 60,
            min_advance_minutes: 120,
            max_advance_days: 30,
            dst_gap: DstPolicy::default(),
            mode: AvailabilityMode::default(),
        }
    }
}

fn on_the_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::clinic_default()
    }
}

/// A validated working-hours policy.
#[derive(Debug, Clone)]
pub struct WorkingHoursPolicy {
    timezone: Tz,
    working_days: BTreeSet<u32>,
    day_start: NaiveTime,
    day_end: NaiveTime,
    slot_duration: Duration,
    min_advance: Duration,
    max_advance_days: i64,
    dst_gap: DstPolicy,
    mode: AvailabilityMode,
}

impl WorkingHoursPolicy {
    /// Validate a raw configuration.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidTimezone` if the timezone is not a valid IANA
    /// identifier, and `SlotError::InvalidPolicy` for any other inconsistency.
    /// Nothing is coerced: a bad value always fails.
    pub fn new(config: PolicyConfig) -> Result<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| SlotError::InvalidTimezone(config.timezone.clone()))?;

        if config.day_start >= config.day_end {
            return Err(SlotError::InvalidPolicy(format!(
                "day start {} must be before day end {}",
                config.day_start.format("%H:%M"),
                config.day_end.format("%H:%M")
            )));
        }
        if config.slot_duration_minutes <= 0 {
            return Err(SlotError::InvalidPolicy(format!(
                "slot duration must be positive, got {} minutes",
                config.slot_duration_minutes
            )));
        }
        if config.min_advance_minutes < 0 {
            return Err(SlotError::InvalidPolicy(format!(
                "minimum advance must not be negative, got {} minutes",
                config.min_advance_minutes
            )));
        }
        if config.max_advance_days < 0 {
            return Err(SlotError::InvalidPolicy(format!(
                "maximum advance must not be negative, got {} days",
                config.max_advance_days
            )));
        }
        if config.working_days.is_empty() {
            return Err(SlotError::InvalidPolicy(
                "at least one working day is required".to_string(),
            ));
        }
        if let Some(day) = config.working_days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(SlotError::InvalidPolicy(format!(
                "working day {} is outside 1 (Monday) ..= 7 (Sunday)",
                day
            )));
        }

        let slot_duration = Duration::try_minutes(config.slot_duration_minutes).ok_or_else(|| {
            SlotError::InvalidPolicy(format!(
                "slot duration of {} minutes is out of range",
                config.slot_duration_minutes
            ))
        })?;
        let min_advance = Duration::try_minutes(config.min_advance_minutes).ok_or_else(|| {
            SlotError::InvalidPolicy(format!(
                "minimum advance of {} minutes is out of range",
                config.min_advance_minutes
            ))
        })?;

        Ok(Self {
            timezone,
            working_days: config.working_days.into_iter().collect(),
            day_start: config.day_start,
            day_end: config.day_end,
            slot_duration,
            min_advance,
            max_advance_days: config.max_advance_days,
            dst_gap: config.dst_gap,
            mode: config.mode,
        })
    }

    /// [`PolicyConfig::clinic_default`], already validated.
    pub fn clinic_default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Paris,
            working_days: (1..=5).collect(),
            day_start: on_the_hour(9),
            day_end: on_the_hour(18),
            slot_duration: Duration::minutes(60),
            min_advance: Duration::minutes(120),
            max_advance_days: 30,
            dst_gap: DstPolicy::default(),
            mode: AvailabilityMode::default(),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn working_days(&self) -> impl Iterator<Item = u32> + '_ {
        self.working_days.iter().copied()
    }

    pub fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    pub fn day_end(&self) -> NaiveTime {
        self.day_end
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    pub fn min_advance(&self) -> Duration {
        self.min_advance
    }

    pub fn max_advance_days(&self) -> i64 {
        self.max_advance_days
    }

    pub fn dst_gap(&self) -> DstPolicy {
        self.dst_gap
    }

    pub fn mode(&self) -> AvailabilityMode {
        self.mode
    }

    /// Whether `date` falls on one of the configured ISO weekdays.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days
            .contains(&date.weekday().number_from_monday())
    }

    /// Earliest instant a slot may start at, given the current time.
    pub fn booking_threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.min_advance)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Today's civil date in the policy timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// Last civil date that may be booked, counted from `today`.
    pub fn booking_horizon(&self, today: NaiveDate) -> NaiveDate {
        Duration::try_days(self.max_advance_days)
            .and_then(|days| today.checked_add_signed(days))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Restrict a requested date range to `[today, horizon]`.
    ///
    /// Returns `None` when nothing of the request is bookable.
    pub fn clamp_query(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
        now: DateTime<Utc>,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let today = self.today(now);
        let start = range_start.max(today);
        let end = range_end.min(self.booking_horizon(today));
        (start <= end).then_some((start, end))
    }
}

impl From<&WorkingHoursPolicy> for PolicyConfig {
    fn from(policy: &WorkingHoursPolicy) -> Self {
        Self {
            timezone: policy.timezone.name().to_string(),
            working_days: policy.working_days().collect(),
            day_start: policy.day_start,
            day_end: policy.day_end,
            slot_duration_minutes: policy.slot_duration.num_minutes(),
            min_advance_minutes: policy.min_advance.num_minutes(),
            max_advance_days: policy.max_advance_days,
            dst_gap: policy.dst_gap,
            mode: policy.mode,
        }
    }
}
