use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Fields the transport boundary requires on every prediction request.
///
/// The pipeline itself does not enforce them; see [`RawRecord::validate_required_fields()`].
pub const REQUIRED_FIELDS: [&str; 9] = [
    "country",
    "country_region",
    "source",
    "platform",
    "device_family",
    "os_version",
    "event_1",
    "event_2",
    "event_3",
];

/// Enum representing possible values of a raw record field.
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`, `i64`, `bool` and
/// `Option<T>` (where `None` becomes [`FieldValue::Null`]).
///
/// ```
/// # use revenue_predictor::FieldValue;
/// let country: FieldValue = "es".into();
/// let event: FieldValue = 100.into();
/// let missing: FieldValue = None::<f64>.into();
/// assert_eq!(missing, FieldValue::Null);
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, From, Clone)]
#[serde(untagged)]
pub enum FieldValue {
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A null value.
    Null,
}

impl FieldValue {
    /// Return the string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        if let FieldValue::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    /// Interpret the value as a number.
    ///
    /// Booleans count as `1`/`0` and strings are parsed leniently (surrounding whitespace is
    /// ignored). Nulls and unparseable strings yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::String(s) => s.trim().parse().ok(),
            FieldValue::Null => None,
        }
    }

    /// Return `true` if this is [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A raw, partially-trusted input record: a mapping from field name to value.
///
/// # Examples
/// ```
/// # use revenue_predictor::RawRecord;
/// let record = RawRecord::new()
///     .with("country", "es")
///     .with("platform", "iOS")
///     .with("event_1", 100)
///     .with("event_3", None::<f64>);
/// assert_eq!(record.number("event_1"), Some(100.0));
/// assert_eq!(record.number("event_3"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: HashMap<String, FieldValue>,
}

impl RawRecord {
    /// Create an empty record.
    pub fn new() -> RawRecord {
        RawRecord::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> RawRecord {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Get the raw value of a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Return `true` if the field is present, even if it holds a null.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Numeric view of a field. Returns `None` if the field is absent, null, or not numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Categorical view of a field. Returns `None` if the field is absent, null, or not a string.
    pub fn category(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    /// Iterate over all fields in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Return `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check that every field in [`REQUIRED_FIELDS`] is present (null values count as present).
    ///
    /// This is a transport-layer concern: the pipeline tolerates missing fields on its own. It is
    /// provided so request handlers can reject incomplete requests before predicting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredField`] listing all missing fields in declaration order.
    pub fn validate_required_fields(&self) -> Result<()> {
        let missing = REQUIRED_FIELDS
            .iter()
            .filter(|field| !self.contains(field))
            .map(|field| (*field).to_owned())
            .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingRequiredField(missing))
        }
    }
}

impl From<HashMap<String, FieldValue>> for RawRecord {
    fn from(fields: HashMap<String, FieldValue>) -> Self {
        RawRecord { fields }
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        RawRecord {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, RawRecord};
    use crate::Error;

    #[test]
    fn parses_request_payload() {
        let record: RawRecord = serde_json::from_str(
            r#"
              {
                "country": "es",
                "country_region": "Madrid",
                "source": "Organic",
                "platform": "iOS",
                "device_family": "Apple iPhone",
                "os_version": "14.4",
                "event_1": 100,
                "event_2": 50,
                "event_3": null
              }
            "#,
        )
        .unwrap();

        assert_eq!(record.category("country"), Some("es"));
        assert_eq!(record.number("event_1"), Some(100.0));
        assert_eq!(record.get("event_3"), Some(&FieldValue::Null));
        assert!(record.contains("event_3"));
        assert_eq!(record.number("event_3"), None);
        assert!(record.validate_required_fields().is_ok());
    }

    #[test]
    fn numeric_view_is_lenient() {
        let record = RawRecord::new()
            .with("as_string", " 12.5 ")
            .with("as_bool", true)
            .with("garbage", "twelve");

        assert_eq!(record.number("as_string"), Some(12.5));
        assert_eq!(record.number("as_bool"), Some(1.0));
        assert_eq!(record.number("garbage"), None);
        assert_eq!(record.number("absent"), None);
    }

    #[test]
    fn category_view_ignores_non_strings() {
        let record = RawRecord::new().with("country", 42).with("platform", None::<&str>);

        assert_eq!(record.category("country"), None);
        assert_eq!(record.category("platform"), None);
        assert!(record.contains("platform"));
    }

    #[test]
    fn reports_all_missing_required_fields() {
        let record = RawRecord::new().with("country", "es").with("platform", "iOS");

        match record.validate_required_fields() {
            Err(Error::MissingRequiredField(missing)) => assert_eq!(
                missing,
                vec![
                    "country_region",
                    "source",
                    "device_family",
                    "os_version",
                    "event_1",
                    "event_2",
                    "event_3"
                ]
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
