//! Shared identifiers, traits, and lenient decoding helpers for stored records.

use std::{cell::RefCell, fmt};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::currency::{parse_amount, round_cents};

/// Opaque record identifier.
///
/// New records receive a UUID; identifiers written by older versions
/// (timestamps, sometimes stored as JSON numbers) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix used when listing records.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawScalar::deserialize(deserializer)? {
            RawScalar::Text(text) if !text.trim().is_empty() => Ok(EntityId::from(text)),
            RawScalar::Integer(value) => Ok(EntityId(value.to_string())),
            RawScalar::Float(value) if value.is_finite() => Ok(EntityId(format!("{}", value))),
            _ => Err(de::Error::custom("record id must be a non-empty string or number")),
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::generate()
    }
}

/// Exposes a stable identifier for stored records.
pub trait Identifiable {
    fn id(&self) -> &EntityId;
}

/// Provides read-only access to a record's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Supplies a common contract for retrieving a budgeted amount.
pub trait Amounted {
    fn amount(&self) -> f64;
}

/// Sums amounts and rounds the result to cents.
pub fn sum_amounts<'a, T, I>(items: I) -> f64
where
    T: Amounted + 'a,
    I: IntoIterator<Item = &'a T>,
{
    round_cents(items.into_iter().map(Amounted::amount).sum())
}

/// Matches a record against a user-provided reference: exact id, id prefix,
/// or case-insensitive name.
pub fn matches_reference<T: Identifiable + NamedEntity>(record: &T, reference: &str) -> bool {
    let reference = reference.trim();
    if reference.is_empty() {
        return false;
    }
    let id = record.id().as_str();
    id == reference
        || (reference.len() >= 4 && id.starts_with(reference))
        || record.name().eq_ignore_ascii_case(reference)
}

thread_local! {
    static FALLBACKS: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

fn note_fallback(message: impl FnOnce() -> String) {
    FALLBACKS.with(|cell| {
        if let Some(notes) = cell.borrow_mut().as_mut() {
            notes.push(message());
        }
    });
}

/// Runs `decode` and returns, next to its result, one note per stored value
/// that the lenient deserializers below replaced with a default.
///
/// Outside this call the fallbacks still apply but are not recorded.
pub fn collect_fallbacks<T>(decode: impl FnOnce() -> T) -> (T, Vec<String>) {
    let previous = FALLBACKS.with(|cell| cell.replace(Some(Vec::new())));
    let value = decode();
    let notes = FALLBACKS
        .with(|cell| cell.replace(previous))
        .unwrap_or_default();
    (value, notes)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Nested(de::IgnoredAny),
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScalar::Integer(value) => write!(f, "{}", value),
            RawScalar::Float(value) => write!(f, "{}", value),
            RawScalar::Text(text) => write!(f, "`{}`", text),
            RawScalar::Bool(value) => write!(f, "{}", value),
            RawScalar::Nested(_) => f.write_str("a nested value"),
        }
    }
}

fn is_blank(raw: &RawScalar) -> bool {
    matches!(raw, RawScalar::Text(text) if text.trim().is_empty())
}

/// Decodes an amount stored as a number, a formatted string, or null.
pub fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let Some(raw) = Option::<RawScalar>::deserialize(deserializer)? else {
        return Ok(0.0);
    };
    let value = match &raw {
        RawScalar::Integer(value) => Some(*value as f64),
        RawScalar::Float(value) if value.is_finite() => Some(*value),
        RawScalar::Text(text) if text.trim().is_empty() => Some(0.0),
        RawScalar::Text(text) => parse_amount(text),
        _ => None,
    };
    Ok(value.unwrap_or_else(|| {
        note_fallback(|| format!("unreadable amount {} replaced by 0", raw));
        0.0
    }))
}

/// Decodes a quantity that defaults to one when missing or unreadable.
pub fn deserialize_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let Some(raw) = Option::<RawScalar>::deserialize(deserializer)? else {
        return Ok(1.0);
    };
    let value = match &raw {
        RawScalar::Integer(value) => Some(*value as f64),
        RawScalar::Float(value) if value.is_finite() => Some(*value),
        RawScalar::Text(text) if text.trim().is_empty() => Some(1.0),
        RawScalar::Text(text) => parse_amount(text),
        _ => None,
    };
    Ok(value.unwrap_or_else(|| {
        note_fallback(|| format!("unreadable quantity {} replaced by 1", raw));
        1.0
    }))
}

/// Decodes booleans stored as `true`, `"true"`, `"on"`, `1`, or null.
pub fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let Some(raw) = Option::<RawScalar>::deserialize(deserializer)? else {
        return Ok(false);
    };
    let value = match &raw {
        RawScalar::Bool(value) => Some(*value),
        RawScalar::Integer(value) => Some(*value != 0),
        RawScalar::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Some(true),
            "false" | "off" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    };
    Ok(value.unwrap_or_else(|| {
        note_fallback(|| format!("unreadable flag {} replaced by false", raw));
        false
    }))
}

/// Parses dates written as `YYYY-MM-DD`, `DD/MM/YYYY` or RFC 3339 timestamps.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

/// Decodes an optional date, mapping empty or unreadable values to `None`.
pub fn deserialize_optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    let Some(raw) = Option::<RawScalar>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if is_blank(&raw) {
        return Ok(None);
    }
    let value = match &raw {
        RawScalar::Text(text) => parse_flexible_date(text),
        RawScalar::Integer(millis) => {
            DateTime::from_timestamp_millis(*millis).map(|stamp| stamp.date_naive())
        }
        _ => None,
    };
    if value.is_none() {
        note_fallback(|| format!("unreadable date {} dropped", raw));
    }
    Ok(value)
}

/// Decodes a timestamp, falling back to the current time when absent.
pub fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let Some(raw) = Option::<RawScalar>::deserialize(deserializer)? else {
        return Ok(Utc::now());
    };
    let value = match &raw {
        RawScalar::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|stamp| stamp.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                parse_flexible_date(text)
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }),
        RawScalar::Integer(millis) => DateTime::from_timestamp_millis(*millis),
        _ => None,
    };
    Ok(value.unwrap_or_else(|| {
        note_fallback(|| format!("unreadable timestamp {} replaced by now", raw));
        Utc::now()
    }))
}

/// Decodes free text, tolerating numbers and null.
pub fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = match Option::<RawScalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(RawScalar::Text(text)) => text,
        Some(RawScalar::Integer(value)) => value.to_string(),
        Some(RawScalar::Float(value)) => value.to_string(),
        Some(other) => {
            note_fallback(|| format!("unreadable text {} replaced by an empty string", other));
            String::new()
        }
    };
    Ok(value)
}

/// Decodes a value that has a sensible default, such as a status, keeping
/// the record when the stored value is unknown.
pub fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default + fmt::Debug,
{
    let Some(raw) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(T::default());
    };
    match serde_json::from_value::<T>(raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            let fallback = T::default();
            note_fallback(|| format!("{}; using {:?}", err, fallback));
            Ok(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        id: EntityId,
        #[serde(deserialize_with = "deserialize_amount", default)]
        amount: f64,
        #[serde(deserialize_with = "deserialize_optional_date", default)]
        date: Option<NaiveDate>,
        #[serde(deserialize_with = "deserialize_flag", default)]
        flag: bool,
    }

    #[test]
    fn legacy_numeric_ids_are_preserved() {
        let sample: Sample = serde_json::from_str(r#"{"id": 1700000000000}"#).unwrap();
        assert_eq!(sample.id.as_str(), "1700000000000");
        assert_eq!(sample.amount, 0.0);
        assert!(sample.date.is_none());
    }

    #[test]
    fn amounts_decode_from_formatted_strings() {
        let sample: Sample =
            serde_json::from_str(r#"{"id": "a", "amount": "1 250,40 €", "flag": "on"}"#).unwrap();
        assert_eq!(sample.amount, 1250.4);
        assert!(sample.flag);
    }

    #[test]
    fn dates_accept_several_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_flexible_date("2024-03-15"), expected);
        assert_eq!(parse_flexible_date("15/03/2024"), expected);
        assert_eq!(parse_flexible_date("2024-03-15T10:00:00Z"), expected);
        assert_eq!(parse_flexible_date("soon"), None);
        let sample: Sample = serde_json::from_str(r#"{"id": "b", "date": ""}"#).unwrap();
        assert!(sample.date.is_none());
    }

    #[test]
    fn empty_ids_are_rejected() {
        assert!(serde_json::from_str::<Sample>(r#"{"id": ""}"#).is_err());
    }

    #[derive(Deserialize, Debug, Default, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Mood {
        #[default]
        Calm,
        Busy,
    }

    #[derive(Deserialize)]
    struct Tagged {
        #[serde(deserialize_with = "deserialize_or_default", default)]
        mood: Mood,
        #[serde(deserialize_with = "deserialize_amount", default)]
        amount: f64,
    }

    #[test]
    fn unreadable_values_fall_back_with_a_note() {
        let (sample, notes) = collect_fallbacks(|| {
            serde_json::from_str::<Sample>(
                r#"{"id": "c", "amount": "abc", "date": "someday", "flag": "maybe"}"#,
            )
        });
        let sample = sample.unwrap();
        assert_eq!(sample.amount, 0.0);
        assert!(sample.date.is_none());
        assert!(!sample.flag);
        assert_eq!(notes.len(), 3);
        assert!(notes[0].contains("`abc`"));
        assert!(notes[1].contains("`someday`"));
    }

    #[test]
    fn nested_amounts_and_unknown_variants_keep_the_record() {
        let (tagged, notes) = collect_fallbacks(|| {
            serde_json::from_str::<Tagged>(r#"{"mood": "sleepy", "amount": {"value": 3}}"#)
        });
        let tagged = tagged.unwrap();
        assert_eq!(tagged.mood, Mood::Calm);
        assert_eq!(tagged.amount, 0.0);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains("sleepy"));

        let (tagged, notes) = collect_fallbacks(|| {
            serde_json::from_str::<Tagged>(r#"{"mood": "busy", "amount": "", "extra": null}"#)
        });
        assert_eq!(tagged.unwrap().mood, Mood::Busy);
        assert!(notes.is_empty());
    }

    #[test]
    fn fallbacks_outside_collection_are_not_kept() {
        let sample: Sample = serde_json::from_str(r#"{"id": "d", "amount": "abc"}"#).unwrap();
        assert_eq!(sample.amount, 0.0);
        let ((), notes) = collect_fallbacks(|| ());
        assert!(notes.is_empty());
    }
}
