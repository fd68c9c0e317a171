//! Serde adapters that keep message timestamps in the record wire format.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};
use tillsync_codec::{format_datetime, parse_datetime};

/// `#[serde(with = "timestamp::required")]` for `DateTime<Utc>`.
pub mod required {
    use super::*;

    /// Serializes a timestamp.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_datetime(value))
    }

    /// Deserializes a timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_datetime(&text).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "timestamp::optional")]` for `Option<DateTime<Utc>>`.
pub mod optional {
    use super::*;

    /// Serializes an optional timestamp.
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&format_datetime(value)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional timestamp. Empty strings count as absent.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.trim().is_empty() => {
                parse_datetime(&text).map(Some).map_err(de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}
