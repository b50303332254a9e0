//! Tests for working-hours policy validation, defaults and date arithmetic.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use slot_engine::{AvailabilityMode, DstPolicy, PolicyConfig, SlotError, WorkingHoursPolicy};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

// ── Defaults ────────────────────────────────────────────────────────────────

#[test]
fn clinic_default_is_valid_and_matches_its_config() {
    let from_config = WorkingHoursPolicy::new(PolicyConfig::clinic_default()).unwrap();
    let direct = WorkingHoursPolicy::clinic_default();

    assert_eq!(PolicyConfig::from(&from_config), PolicyConfig::from(&direct));
    assert_eq!(direct.timezone(), chrono_tz::Europe::Paris);
    assert_eq!(direct.working_days().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    assert_eq!(direct.day_start(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(direct.day_end(), NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    assert_eq!(direct.slot_duration(), Duration::minutes(60));
    assert_eq!(direct.min_advance(), Duration::minutes(120));
    assert_eq!(direct.max_advance_days(), 30);
    assert_eq!(direct.dst_gap(), DstPolicy::ShiftForward);
    assert_eq!(direct.mode(), AvailabilityMode::Declared);
}

#[test]
fn partial_json_falls_back_to_clinic_default() {
    let json = r#"{
        "timezone": "America/New_York",
        "day_start": "08:30",
        "mode": "working_hours"
    }"#;

    let config: PolicyConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.timezone, "America/New_York");
    assert_eq!(config.day_start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    assert_eq!(config.mode, AvailabilityMode::WorkingHours);
    assert_eq!(config.slot_duration_minutes, 60);
    assert_eq!(config.working_days, vec![1, 2, 3, 4, 5]);
    assert!(WorkingHoursPolicy::new(config).is_ok());
}

#[test]
fn config_serializes_wall_clock_as_hours_and_minutes() {
    let json = serde_json::to_value(PolicyConfig::clinic_default()).unwrap();

    assert_eq!(json["day_start"], "09:00");
    assert_eq!(json["day_end"], "18:00");
    assert_eq!(json["dst_gap"], "shift_forward");
    assert_eq!(json["mode"], "declared");
}

// ── Validation ──────────────────────────────────────────────────────────────

#[test]
fn unknown_timezone_rejected() {
    let err = WorkingHoursPolicy::new(PolicyConfig {
        timezone: "Mars/Olympus_Mons".to_string(),
        ..PolicyConfig::clinic_default()
    })
    .unwrap_err();

    assert!(matches!(err, SlotError::InvalidTimezone(tz) if tz == "Mars/Olympus_Mons"));
}

#[test]
fn day_start_must_precede_day_end() {
    let same = PolicyConfig {
        day_end: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        ..PolicyConfig::clinic_default()
    };
    assert!(matches!(
        WorkingHoursPolicy::new(same),
        Err(SlotError::InvalidPolicy(_))
    ));

    let inverted = PolicyConfig {
        day_start: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        ..PolicyConfig::clinic_default()
    };
    assert!(matches!(
        WorkingHoursPolicy::new(inverted),
        Err(SlotError::InvalidPolicy(_))
    ));
}

#[test]
fn non_positive_slot_duration_rejected() {
    for minutes in [0, -15] {
        let result = WorkingHoursPolicy::new(PolicyConfig {
            slot_duration_minutes: minutes,
            ..PolicyConfig::clinic_default()
        });
        assert!(
            matches!(result, Err(SlotError::InvalidPolicy(_))),
            "slot duration {} must be rejected",
            minutes
        );
    }
}

#[test]
fn negative_advance_windows_rejected() {
    let negative_notice = WorkingHoursPolicy::new(PolicyConfig {
        min_advance_minutes: -1,
        ..PolicyConfig::clinic_default()
    });
    assert!(matches!(negative_notice, Err(SlotError::InvalidPolicy(_))));

    let negative_horizon = WorkingHoursPolicy::new(PolicyConfig {
        max_advance_days: -1,
        ..PolicyConfig::clinic_default()
    });
    assert!(matches!(negative_horizon, Err(SlotError::InvalidPolicy(_))));
}

#[test]
fn zero_advance_notice_allowed() {
    let policy = WorkingHoursPolicy::new(PolicyConfig {
        min_advance_minutes: 0,
        ..PolicyConfig::clinic_default()
    })
    .unwrap();
    let now = at("2026-01-12T10:00:00Z");

    assert_eq!(policy.booking_threshold(now), now);
}

#[test]
fn working_days_must_be_non_empty_iso_weekdays() {
    let empty = WorkingHoursPolicy::new(PolicyConfig {
        working_days: vec![],
        ..PolicyConfig::clinic_default()
    });
    assert!(matches!(empty, Err(SlotError::InvalidPolicy(_))));

    for bad in [0, 8] {
        let result = WorkingHoursPolicy::new(PolicyConfig {
            working_days: vec![1, bad],
            ..PolicyConfig::clinic_default()
        });
        assert!(
            matches!(result, Err(SlotError::InvalidPolicy(_))),
            "weekday {} must be rejected",
            bad
        );
    }
}

// ── Calendar arithmetic ─────────────────────────────────────────────────────

#[test]
fn working_days_follow_iso_numbering() {
    let policy = WorkingHoursPolicy::new(PolicyConfig {
        working_days: vec![1, 2, 4, 5, 7],
        ..PolicyConfig::clinic_default()
    })
    .unwrap();

    assert!(policy.is_working_day(date("2026-01-12"))); // Monday
    assert!(!policy.is_working_day(date("2026-01-14"))); // Wednesday
    assert!(!policy.is_working_day(date("2026-01-17"))); // Saturday
    assert!(policy.is_working_day(date("2026-01-18"))); // Sunday
}

#[test]
fn today_is_taken_in_policy_timezone() {
    let policy = WorkingHoursPolicy::clinic_default();

    // 23:30Z on the 12th is already 00:30 on the 13th in Paris.
    assert_eq!(policy.today(at("2026-01-12T23:30:00Z")), date("2026-01-13"));
    assert_eq!(policy.today(at("2026-01-12T22:30:00Z")), date("2026-01-12"));
}

#[test]
fn clamp_query_restricts_to_today_and_horizon() {
    let policy = WorkingHoursPolicy::clinic_default();
    let now = at("2026-01-12T10:00:00Z");

    assert_eq!(policy.booking_horizon(date("2026-01-12")), date("2026-02-11"));
    assert_eq!(
        policy.clamp_query(date("2026-01-01"), date("2026-03-01"), now),
        Some((date("2026-01-12"), date("2026-02-11")))
    );
    assert_eq!(
        policy.clamp_query(date("2026-01-20"), date("2026-01-25"), now),
        Some((date("2026-01-20"), date("2026-01-25")))
    );
}

#[test]
fn clamp_query_outside_window_is_none() {
    let policy = WorkingHoursPolicy::clinic_default();
    let now = at("2026-01-12T10:00:00Z");

    assert_eq!(
        policy.clamp_query(date("2026-01-01"), date("2026-01-11"), now),
        None
    );
    assert_eq!(
        policy.clamp_query(date("2026-02-12"), date("2026-02-20"), now),
        None
    );
    assert_eq!(
        policy.clamp_query(date("2026-01-20"), date("2026-01-19"), now),
        None
    );
}
