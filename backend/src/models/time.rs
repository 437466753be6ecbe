//! Time handling for meeting slots.
//!
//! Slots arrive at the boundary as naive local wall-clock strings
//! (`YYYY-MM-DDTHH:MM`, as produced by a `datetime-local` form field) and are
//! stored as absolute instants. Rule evaluation that depends on hour-of-day or
//! day-of-week happens in an explicitly configured timezone, never the host's.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Accepted naive local formats, most specific first.
const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Render an instant in the canonical universal-time form used for storage
/// and API output (`2024-06-03T08:30:00.000Z`).
pub fn to_canonical(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a boundary date-time string into an absolute instant.
///
/// Naive strings are interpreted as wall-clock time in `tz`. Strings that
/// carry their own offset (RFC 3339) are taken as-is. Returns `None` for
/// blank or malformed input and for local times skipped by a DST transition;
/// an ambiguous local time resolves to the earlier of its two instants.
pub fn parse_local_datetime(text: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Serde adapter writing `DateTime<Utc>` in the canonical string form.
pub mod canonical_instant {
    use super::to_canonical;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_canonical(instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// A proposed contiguous time interval, normalized to absolute instants.
///
/// Construction does not enforce `end > start`; that is the validator's job,
/// which reports misordered intervals with a specific reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    #[serde(with = "canonical_instant")]
    pub start: DateTime<Utc>,
    #[serde(with = "canonical_instant")]
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    pub fn is_ordered(&self) -> bool {
        self.end > self.start
    }

    pub fn canonical_start(&self) -> String {
        to_canonical(&self.start)
    }

    pub fn canonical_end(&self) -> String {
        to_canonical(&self.end)
    }
}
