//! Creation timestamps.
//!
//! `createdAt` is stored as an RFC 3339 string with fixed millisecond
//! precision, so lexical order on the stored value equals time order and a
//! backend can sort on it directly.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Current time truncated to whole milliseconds (the stored precision).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// `#[serde(with = "itrax_core::time::millis")]`
pub mod millis {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Stamp {
        #[serde(with = "millis")]
        at: DateTime<Utc>,
    }

    #[test]
    fn millis_format_is_fixed_width() {
        let at = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let json = serde_json::to_value(Stamp { at }).unwrap();
        assert_eq!(json["at"], "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn truncated_now_survives_a_round_trip() {
        let stamp = Stamp { at: now() };
        let json = serde_json::to_string(&stamp).unwrap();
        let back: Stamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stamp);
    }
}
