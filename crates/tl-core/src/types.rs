//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An interval whose end does not come after its start.
    #[error("end ({end}) must be after start ({start})")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A stored duration below zero.
    #[error("duration cannot be negative, got {value}s")]
    NegativeDuration { value: i64 },

    /// A stored duration that does not match its interval.
    #[error("duration {actual}s does not match interval length {expected}s")]
    InconsistentDuration { expected: i64, actual: i64 },

    /// A month selector that is not `YYYY-MM` or is out of range.
    #[error("invalid month: {value} (expected YYYY-MM)")]
    InvalidMonth { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Generates a fresh random ID.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A durable group identifier.
    ///
    /// Assigned once when the group is created and never derived from the
    /// group's position in a collection.
    GroupId, "group ID"
);

/// Serde adapter for instants stored as epoch milliseconds.
///
/// Files written by older versions of the app carry either epoch
/// milliseconds or ISO 8601 strings, so both are accepted on read.
/// Writing always produces integer milliseconds.
pub mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum RawTimestamp {
        Millis(i64),
        Fractional(f64),
        Text(String),
    }

    impl RawTimestamp {
        #[allow(clippy::cast_possible_truncation)]
        pub(super) fn into_datetime(self) -> Result<DateTime<Utc>, String> {
            match self {
                Self::Millis(ms) => DateTime::from_timestamp_millis(ms)
                    .ok_or_else(|| format!("timestamp out of range: {ms}")),
                Self::Fractional(ms) if ms.is_finite() => {
                    let rounded = ms.floor() as i64;
                    DateTime::from_timestamp_millis(rounded)
                        .ok_or_else(|| format!("timestamp out of range: {ms}"))
                }
                Self::Fractional(ms) => Err(format!("invalid timestamp: {ms}")),
                Self::Text(text) => DateTime::parse_from_rfc3339(&text)
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .map_err(|err| format!("invalid timestamp {text:?}: {err}")),
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        RawTimestamp::deserialize(deserializer)?
            .into_datetime()
            .map_err(serde::de::Error::custom)
    }
}

/// Like [`epoch_millis`], for optional instants (`null` when absent).
pub mod epoch_millis_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::epoch_millis::RawTimestamp;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(instant) => serializer.serialize_some(&instant.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<RawTimestamp>::deserialize(deserializer)?
            .map(RawTimestamp::into_datetime)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
