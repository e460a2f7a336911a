//! Field values
//!
//! [`FieldValue`] is a closed set of the value shapes a log field can hold.
//! Typed accessors return [`LogError::KindMismatch`] rather than panicking
//! when asked for the wrong kind.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LogError, Result};
use crate::field::Field;
use crate::options::DEFAULT_TIME_LAYOUT;

/// Discriminant of a [`FieldValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    I64,
    I64s,
    U64,
    U64s,
    F64,
    F64s,
    Str,
    Strs,
    Bool,
    Bools,
    Time,
    Duration,
    Field,
    Fields,
    Error,
    Json,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::I64 => "int64",
            Kind::I64s => "int64s",
            Kind::U64 => "uint64",
            Kind::U64s => "uint64s",
            Kind::F64 => "float64",
            Kind::F64s => "float64s",
            Kind::Str => "string",
            Kind::Strs => "strings",
            Kind::Bool => "bool",
            Kind::Bools => "bools",
            Kind::Time => "time",
            Kind::Duration => "duration",
            Kind::Field => "field",
            Kind::Fields => "fields",
            Kind::Error => "error",
            Kind::Json => "json",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value carried by a log field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    I64(i64),
    I64s(Vec<i64>),
    U64(u64),
    U64s(Vec<u64>),
    F64(f64),
    F64s(Vec<f64>),
    Str(String),
    Strs(Vec<String>),
    Bool(bool),
    Bools(Vec<bool>),
    Time(DateTime<Local>),
    Duration(Duration),
    /// A single nested field, rendered `key.inner=value`
    Field(Box<Field>),
    Fields(Vec<Field>),
    /// An error message
    Error(String),
    /// Arbitrary serializable data
    Json(Value),
}

impl FieldValue {
    pub fn kind(&self) -> Kind {
        match self {
            FieldValue::I64(_) => Kind::I64,
            FieldValue::I64s(_) => Kind::I64s,
            FieldValue::U64(_) => Kind::U64,
            FieldValue::U64s(_) => Kind::U64s,
            FieldValue::F64(_) => Kind::F64,
            FieldValue::F64s(_) => Kind::F64s,
            FieldValue::Str(_) => Kind::Str,
            FieldValue::Strs(_) => Kind::Strs,
            FieldValue::Bool(_) => Kind::Bool,
            FieldValue::Bools(_) => Kind::Bools,
            FieldValue::Time(_) => Kind::Time,
            FieldValue::Duration(_) => Kind::Duration,
            FieldValue::Field(_) => Kind::Field,
            FieldValue::Fields(_) => Kind::Fields,
            FieldValue::Error(_) => Kind::Error,
            FieldValue::Json(_) => Kind::Json,
        }
    }

    fn mismatch(&self, expected: Kind) -> LogError {
        LogError::kind_mismatch(expected, self.kind())
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            FieldValue::I64(v) => Ok(*v),
            _ => Err(self.mismatch(Kind::I64)),
        }
    }

    pub fn as_i64s(&self) -> Result<&[i64]> {
        match self {
            FieldValue::I64s(v) => Ok(v),
            _ => Err(self.mismatch(Kind::I64s)),
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        match self {
            FieldValue::U64(v) => Ok(*v),
            _ => Err(self.mismatch(Kind::U64)),
        }
    }

    pub fn as_u64s(&self) -> Result<&[u64]> {
        match self {
            FieldValue::U64s(v) => Ok(v),
            _ => Err(self.mismatch(Kind::U64s)),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            FieldValue::F64(v) => Ok(*v),
            _ => Err(self.mismatch(Kind::F64)),
        }
    }

    pub fn as_f64s(&self) -> Result<&[f64]> {
        match self {
            FieldValue::F64s(v) => Ok(v),
            _ => Err(self.mismatch(Kind::F64s)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            FieldValue::Str(v) => Ok(v),
            _ => Err(self.mismatch(Kind::Str)),
        }
    }

    pub fn as_strs(&self) -> Result<&[String]> {
        match self {
            FieldValue::Strs(v) => Ok(v),
            _ => Err(self.mismatch(Kind::Strs)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            FieldValue::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(Kind::Bool)),
        }
    }

    pub fn as_bools(&self) -> Result<&[bool]> {
        match self {
            FieldValue::Bools(v) => Ok(v),
            _ => Err(self.mismatch(Kind::Bools)),
        }
    }

    pub fn as_time(&self) -> Result<DateTime<Local>> {
        match self {
            FieldValue::Time(v) => Ok(*v),
            _ => Err(self.mismatch(Kind::Time)),
        }
    }

    pub fn as_duration(&self) -> Result<Duration> {
        match self {
            FieldValue::Duration(v) => Ok(*v),
            _ => Err(self.mismatch(Kind::Duration)),
        }
    }

    pub fn as_field(&self) -> Result<&Field> {
        match self {
            FieldValue::Field(v) => Ok(v),
            _ => Err(self.mismatch(Kind::Field)),
        }
    }

    pub fn as_fields(&self) -> Result<&[Field]> {
        match self {
            FieldValue::Fields(v) => Ok(v),
            _ => Err(self.mismatch(Kind::Fields)),
        }
    }

    /// The error message of an error value
    pub fn as_error(&self) -> Result<&str> {
        match self {
            FieldValue::Error(v) => Ok(v),
            _ => Err(self.mismatch(Kind::Error)),
        }
    }

    pub fn as_json(&self) -> Result<&Value> {
        match self {
            FieldValue::Json(v) => Ok(v),
            _ => Err(self.mismatch(Kind::Json)),
        }
    }

    /// JSON form of the value
    ///
    /// Non-finite floats become `null`, durations their text form, times
    /// RFC 3339 strings.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::I64(v) => Value::from(*v),
            FieldValue::I64s(v) => Value::from(v.clone()),
            FieldValue::U64(v) => Value::from(*v),
            FieldValue::U64s(v) => Value::from(v.clone()),
            FieldValue::F64(v) => float_json(*v),
            FieldValue::F64s(v) => Value::Array(v.iter().copied().map(float_json).collect()),
            FieldValue::Str(v) => Value::from(v.as_str()),
            FieldValue::Strs(v) => Value::from(v.clone()),
            FieldValue::Bool(v) => Value::from(*v),
            FieldValue::Bools(v) => Value::from(v.clone()),
            FieldValue::Time(v) => Value::from(v.to_rfc3339()),
            FieldValue::Duration(v) => Value::from(format!("{v:?}")),
            FieldValue::Field(v) => v.to_json(),
            FieldValue::Fields(v) => Value::Array(v.iter().map(Field::to_json).collect()),
            FieldValue::Error(v) => Value::from(v.as_str()),
            FieldValue::Json(v) => v.clone(),
        }
    }
}

fn float_json(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

/// Text form of the value, as it appears after `key=`
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::I64s(v) => write_list(f, v),
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::U64s(v) => write_list(f, v),
            FieldValue::F64(v) => write!(f, "{v}"),
            FieldValue::F64s(v) => write_list(f, v),
            FieldValue::Str(v) => f.write_str(v),
            FieldValue::Strs(v) => write_list(f, v),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Bools(v) => write_list(f, v),
            FieldValue::Time(v) => write!(f, "{}", v.format(DEFAULT_TIME_LAYOUT)),
            FieldValue::Duration(v) => write!(f, "{v:?}"),
            FieldValue::Field(v) => write!(f, "{v}"),
            FieldValue::Fields(v) => write_list(f, v),
            FieldValue::Error(v) => write!(f, "err: {v}"),
            FieldValue::Json(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::I64(v as i64)
            }
        }

        impl From<Vec<$t>> for FieldValue {
            fn from(v: Vec<$t>) -> Self {
                FieldValue::I64s(v.into_iter().map(|n| n as i64).collect())
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::U64(v as u64)
            }
        }

        impl From<Vec<$t>> for FieldValue {
            fn from(v: Vec<$t>) -> Self {
                FieldValue::U64s(v.into_iter().map(|n| n as u64).collect())
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::F64(f64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::F64(v)
    }
}

impl From<Vec<f32>> for FieldValue {
    fn from(v: Vec<f32>) -> Self {
        FieldValue::F64s(v.into_iter().map(f64::from).collect())
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        FieldValue::F64s(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Str(v.clone())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::Strs(v)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(v: Vec<&str>) -> Self {
        FieldValue::Strs(v.into_iter().map(str::to_string).collect())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Vec<bool>> for FieldValue {
    fn from(v: Vec<bool>) -> Self {
        FieldValue::Bools(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FieldValue {
    fn from(v: DateTime<Tz>) -> Self {
        FieldValue::Time(v.with_timezone(&Local))
    }
}

impl From<Duration> for FieldValue {
    fn from(v: Duration) -> Self {
        FieldValue::Duration(v)
    }
}

impl From<Field> for FieldValue {
    fn from(v: Field) -> Self {
        FieldValue::Field(Box::new(v))
    }
}

impl From<Vec<Field>> for FieldValue {
    fn from(v: Vec<Field>) -> Self {
        FieldValue::Fields(v)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Json(v)
    }
}
