//! Canonical timestamps
//!
//! Every point in time crossing a persistence or network boundary is written
//! as RFC 3339 text in UTC with millisecond precision and a `Z` suffix, the
//! same shape the remote document store uses for its native timestamp type.
//! In memory, timestamps are `chrono::DateTime<Utc>` truncated to
//! milliseconds so that a write followed by a read reproduces the instant
//! exactly.

use crate::errors::{LarderError, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// Native point-in-time value
pub type Timestamp = DateTime<Utc>;

/// Render a timestamp in canonical wire form, e.g. `2024-05-01T09:30:00.125Z`
pub fn to_canonical(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse RFC 3339 text into a UTC timestamp truncated to milliseconds
pub fn parse_canonical(text: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
        .map_err(|e| LarderError::invalid(format!("Invalid timestamp '{text}': {e}")))
}

/// Build a timestamp from unix epoch milliseconds
pub fn from_epoch_millis(millis: i64) -> Option<Timestamp> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Source of the current time
///
/// Injected into stores so tests can pin `claimedAt` values.
pub trait Clock: Send + Sync {
    /// Current time, truncated to milliseconds
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().trunc_subsecs(3)
    }
}

/// Serde adapter writing a required timestamp as canonical text
pub mod canonical {
    use super::{parse_canonical, to_canonical, Timestamp};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize as canonical text
    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_canonical(ts))
    }

    /// Deserialize from RFC 3339 text
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_canonical(&text).map_err(D::Error::custom)
    }
}

/// Serde adapter for optional timestamps, strict on read
pub mod canonical_option {
    use super::{parse_canonical, to_canonical, Timestamp};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize as canonical text or null
    pub fn serialize<S: Serializer>(
        ts: &Option<Timestamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&to_canonical(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from RFC 3339 text or null
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => parse_canonical(&text).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

/// Serde adapter for cached timestamps that must never fail a whole record
///
/// Accepts canonical text, epoch milliseconds, or the remote store's
/// `{ "seconds": .., "nanoseconds": .. }` object. Anything unreadable becomes
/// `None` rather than a fabricated date.
pub mod lenient_option {
    use super::{from_epoch_millis, parse_canonical, to_canonical, Timestamp};
    use chrono::{SubsecRound, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    /// Serialize as canonical text or null
    pub fn serialize<S: Serializer>(
        ts: &Option<Timestamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&to_canonical(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize leniently, mapping unreadable input to `None`
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(interpret))
    }

    fn interpret(raw: &Value) -> Option<Timestamp> {
        let parsed = match raw {
            Value::Null => return None,
            Value::String(text) => parse_canonical(text).ok(),
            Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
            Value::Object(fields) => {
                let seconds = fields.get("seconds").and_then(Value::as_i64);
                let nanos = fields
                    .get("nanoseconds")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                seconds.and_then(|s| {
                    Utc.timestamp_opt(s, u32::try_from(nanos).ok()?)
                        .single()
                        .map(|ts| ts.trunc_subsecs(3))
                })
            }
            _ => None,
        };
        if parsed.is_none() {
            tracing::warn!(raw = %raw, "Unreadable cached timestamp, keeping null marker");
        }
        parsed
    }
}
