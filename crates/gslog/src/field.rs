//! Key/value fields attached to log entries

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::value::FieldValue;

/// A single key/value pair on a log entry
///
/// Text form is `key=value`, or `key.inner=value` when the value is itself
/// a field. JSON form is a one-key object `{"key": value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::Str(value.into()))
    }

    pub fn int(key: impl Into<String>, value: impl Into<i64>) -> Self {
        Self::new(key, FieldValue::I64(value.into()))
    }

    pub fn uint(key: impl Into<String>, value: impl Into<u64>) -> Self {
        Self::new(key, FieldValue::U64(value.into()))
    }

    pub fn float(key: impl Into<String>, value: impl Into<f64>) -> Self {
        Self::new(key, FieldValue::F64(value.into()))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn time<Tz: TimeZone>(key: impl Into<String>, value: DateTime<Tz>) -> Self {
        Self::new(key, value)
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    /// An error field holding the error's message
    pub fn error(key: impl Into<String>, err: &dyn std::error::Error) -> Self {
        Self::new(key, FieldValue::Error(err.to_string()))
    }

    /// One error field for several errors, messages joined by newlines
    pub fn errors<I, E>(key: impl Into<String>, errs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: fmt::Display,
    {
        let joined = errs
            .into_iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(key, FieldValue::Error(joined))
    }

    /// Group fields under one key
    ///
    /// A single field nests as `key.inner=value`; any other number becomes
    /// a list.
    pub fn nested(key: impl Into<String>, mut fields: Vec<Field>) -> Self {
        if fields.len() == 1 {
            if let Some(only) = fields.pop() {
                return Self::new(key, only);
            }
        }
        Self::new(key, FieldValue::Fields(fields))
    }

    /// A field holding any serializable value as JSON
    pub fn json<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self::new(key, FieldValue::Json(serde_json::to_value(value)?)))
    }

    /// JSON form: `{"key": value}`
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(self.key.clone(), self.value.to_json());
        Value::Object(object)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FieldValue::Field(inner) => write!(f, "{}.{inner}", self.key),
            value => write!(f, "{}={value}", self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;
    use serde_json::json;
    use std::io;

    #[test]
    fn test_constructors() {
        assert_eq!(Field::int("n", 5i8).value, FieldValue::I64(5));
        assert_eq!(Field::uint("n", 5u32).value, FieldValue::U64(5));
        assert_eq!(Field::float("f", 0.5f32).value, FieldValue::F64(0.5));
        assert_eq!(Field::string("s", "v").to_string(), "s=v");
        assert_eq!(Field::bool("ok", true).to_string(), "ok=true");
        assert_eq!(
            Field::duration("took", Duration::from_millis(20)).to_string(),
            "took=20ms"
        );
    }

    #[test]
    fn test_error_fields() {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing config");
        assert_eq!(Field::error("err", &err).to_string(), "err=err: missing config");

        let joined = Field::errors("errs", ["first", "second"]);
        assert_eq!(joined.value.as_error().unwrap(), "first\nsecond");
    }

    #[test]
    fn test_nested_single() {
        let field = Field::nested("http", vec![Field::int("status", 200)]);
        assert_eq!(field.value.kind(), Kind::Field);
        assert_eq!(field.to_string(), "http.status=200");
        assert_eq!(field.to_json(), json!({"http": {"status": 200}}));
    }

    #[test]
    fn test_nested_many() {
        let field = Field::nested(
            "http",
            vec![Field::int("status", 200), Field::string("method", "GET")],
        );
        assert_eq!(field.value.kind(), Kind::Fields);
        assert_eq!(field.to_string(), "http=[status=200, method=GET]");
        assert_eq!(
            field.to_json(),
            json!({"http": [{"status": 200}, {"method": "GET"}]})
        );
    }

    #[test]
    fn test_nested_empty() {
        let field = Field::nested("none", Vec::new());
        assert_eq!(field.to_string(), "none=[]");
    }

    #[test]
    fn test_json_field() {
        #[derive(Serialize)]
        struct Peer {
            id: u32,
            addr: &'static str,
        }

        let field = Field::json("peer", &Peer { id: 7, addr: "10.0.0.1" }).unwrap();
        assert_eq!(field.to_json(), json!({"peer": {"id": 7, "addr": "10.0.0.1"}}));
        let text = field.to_string();
        assert!(text.starts_with("peer={"));
        assert!(text.contains(r#""addr":"10.0.0.1""#));
    }
}
