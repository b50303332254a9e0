//! DST transition handling for wall-clock bounds.
//!
//! Working-hours bounds and all-day events are expressed as local wall-clock
//! times. On transition days such a time may not exist (spring forward) or may
//! exist twice (fall back); this module decides which instant it maps to.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for wall-clock times that fall inside a DST gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop the time entirely (e.g., 02:30 on spring-forward day has no instant).
    Skip,
    /// Move to the first valid wall-clock time after the gap.
    #[default]
    ShiftForward,
}

/// Map a local wall-clock time in `tz` to an absolute instant.
///
/// Ambiguous times (fall back) resolve to the earlier instant. Times in a gap
/// follow `policy`. Gaps are never longer than a few hours, so the forward
/// search is bounded.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Tz>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt);
    }

    match policy {
        DstPolicy::Skip => None,
        DstPolicy::ShiftForward => {
            // Step minute by minute until the wall clock exists again.
            let mut probe = naive;
            for _ in 0..(24 * 60) {
                probe += Duration::minutes(1);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return Some(dt);
                }
            }
            None
        }
    }
}
