//! Serde helpers for wall-clock times written as `"HH:MM"`.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

pub(crate) const FORMAT: &str = "%H:%M";

pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(FORMAT))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// Parse `"HH:MM"`, tolerating a trailing `":SS"`.
pub(crate) fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(raw, FORMAT).or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
}
