use chrono::{Duration, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*$").expect("valid time regex"));

/// Parses venue-local wall-clock input in `HH:MM` form. Anything else maps
/// to "absent" rather than an error.
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(input)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn format_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Adds minutes on a 24h clock, wrapping past midnight (gigs are same-day,
/// so no day rollover is tracked). An absent time stays absent.
pub fn add_minutes(time: Option<NaiveTime>, minutes: i64) -> Option<NaiveTime> {
    time.map(|t| t.overflowing_add_signed(Duration::minutes(minutes)).0)
}

/// Total order on wall-clock times by (hour, minute).
pub fn is_after(a: NaiveTime, b: NaiveTime) -> bool {
    a > b
}

pub fn is_at_or_after(a: NaiveTime, b: NaiveTime) -> bool {
    a >= b
}

/// Serde adaptor for optional times stored as `HH:MM` strings, with the
/// empty string standing in for "absent".
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_time, parse_time};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&format_time(*time)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(parse_time(&raw))
    }
}
