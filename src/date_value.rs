//! Date values as they arrive from stored records and API payloads.
//!
//! A date can be a native instant, a provider timestamp (seconds plus
//! nanoseconds) or a string. The shape is decided once, when the value is
//! decoded, so display code never has to sniff it again.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    Native(DateTime<Utc>),
    EpochSeconds { seconds: i64, nanos: u32 },
    IsoString(String),
}

impl DateValue {
    /// Decode a JSON value. Returns `None` for shapes that cannot carry a date.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::IsoString(text.clone())),
            Value::Number(number) => number.as_i64().map(|seconds| Self::EpochSeconds {
                seconds,
                nanos: 0,
            }),
            Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(Value::as_i64)?;
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                Some(Self::EpochSeconds {
                    seconds,
                    nanos: u32::try_from(nanos).ok()?,
                })
            }
            _ => None,
        }
    }

    /// Resolve to an instant, if the value is parseable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Native(instant) => Some(*instant),
            Self::EpochSeconds { seconds, nanos } => DateTime::from_timestamp(*seconds, *nanos),
            Self::IsoString(text) => parse_date_string(text),
        }
    }

    /// The value as stored: strings verbatim, instants as RFC 3339. Epoch
    /// values outside chrono's range keep their raw `seconds.nanos` form.
    pub fn to_raw_string(&self) -> String {
        match self {
            Self::IsoString(text) => text.clone(),
            Self::Native(instant) => instant.to_rfc3339(),
            Self::EpochSeconds { seconds, nanos } => DateTime::from_timestamp(*seconds, *nanos)
                .map(|instant| instant.to_rfc3339())
                .unwrap_or_else(|| format!("{seconds}.{nanos:09}")),
        }
    }

    /// Whether a timestamp-shaped value names a representable instant.
    /// Strings always qualify; unparseable text is kept as entered.
    pub fn is_representable(&self) -> bool {
        match self {
            Self::EpochSeconds { .. } => self.to_datetime().is_some(),
            _ => true,
        }
    }
}

impl From<DateTime<Utc>> for DateValue {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Native(instant)
    }
}

fn parse_date_string(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Native(instant) => serializer.serialize_str(&instant.to_rfc3339()),
            Self::EpochSeconds { seconds, nanos } => {
                json!({ "seconds": seconds, "nanoseconds": nanos }).serialize(serializer)
            }
            Self::IsoString(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for DateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| {
            de::Error::custom(format!(
                "expected a date string, epoch seconds or timestamp object, got {value}"
            ))
        })
    }
}

impl utoipa::PartialSchema for DateValue {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        let object = utoipa::openapi::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::Type::String)
            .description(Some(
                "ISO 8601 date or date-time; timestamp objects and epoch seconds are also accepted",
            ))
            .build();
        utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object))
    }
}

impl utoipa::ToSchema for DateValue {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_all_three_shapes() {
        let iso: DateValue = serde_json::from_value(json!("2025-04-15T10:30:00Z")).unwrap();
        assert_eq!(iso, DateValue::IsoString("2025-04-15T10:30:00Z".to_string()));

        let stamp: DateValue =
            serde_json::from_value(json!({"seconds": 1744713000, "nanoseconds": 5})).unwrap();
        assert_eq!(
            stamp,
            DateValue::EpochSeconds {
                seconds: 1_744_713_000,
                nanos: 5
            }
        );

        let underscored: DateValue =
            serde_json::from_value(json!({"_seconds": 1744713000, "_nanoseconds": 0})).unwrap();
        assert_eq!(
            underscored,
            DateValue::EpochSeconds {
                seconds: 1_744_713_000,
                nanos: 0
            }
        );

        let epoch: DateValue = serde_json::from_value(json!(1744713000)).unwrap();
        assert_eq!(
            epoch.to_datetime(),
            Some(Utc.with_ymd_and_hms(2025, 4, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn rejects_shapes_without_a_date() {
        assert!(serde_json::from_value::<DateValue>(json!(true)).is_err());
        assert!(serde_json::from_value::<DateValue>(json!({"name": "x"})).is_err());
        assert!(serde_json::from_value::<DateValue>(json!([1, 2])).is_err());
    }

    #[test]
    fn date_only_strings_resolve_to_utc_midnight() {
        let value = DateValue::IsoString("2025-04-01".to_string());
        assert_eq!(
            value.to_datetime(),
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let value = DateValue::IsoString("2025-04-01T02:00:00+05:30".to_string());
        assert_eq!(
            value.to_datetime(),
            Some(Utc.with_ymd_and_hms(2025, 3, 31, 20, 30, 0).unwrap())
        );
    }

    #[test]
    fn garbage_strings_do_not_parse() {
        assert_eq!(DateValue::IsoString("next tuesday".to_string()).to_datetime(), None);
        assert_eq!(DateValue::IsoString(String::new()).to_datetime(), None);
    }

    #[test]
    fn raw_string_keeps_original_text() {
        assert_eq!(
            DateValue::IsoString("not a date".to_string()).to_raw_string(),
            "not a date"
        );
        let native = DateValue::from(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(native.to_raw_string(), "2025-01-02T03:04:05+00:00");
    }

    #[test]
    fn out_of_range_epochs_keep_their_raw_value() {
        let value = DateValue::EpochSeconds {
            seconds: i64::MAX,
            nanos: 5,
        };

        assert_eq!(value.to_datetime(), None);
        assert!(!value.is_representable());
        assert_eq!(value.to_raw_string(), "9223372036854775807.000000005");

        let epoch = DateValue::EpochSeconds {
            seconds: 1_744_713_000,
            nanos: 0,
        };
        assert!(epoch.is_representable());
        assert_eq!(epoch.to_raw_string(), "2025-04-15T10:30:00+00:00");
        assert!(DateValue::IsoString("next tuesday".to_string()).is_representable());
    }
}
