//! Log entries

use std::fmt;
use std::panic::Location;

use chrono::{DateTime, Local};

use crate::field::Field;
use crate::level::Level;
use crate::value::FieldValue;

/// Key used for loose arguments that could not be paired with a key
pub const BAD_FIELDS_KEY: &str = "!badFieldsKey";

/// Rendered in place of a missing source location
pub const UNKNOWN_FILE: &str = "!unknownFile";

/// Where a log call was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub file: &'static str,
    pub line: u32,
}

impl Source {
    /// Location of the caller, following `#[track_caller]` frames
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One log record on its way to a handler
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub time: DateTime<Local>,
    pub level: Level,
    pub message: String,
    pub source: Option<Source>,
    pub fields: Vec<Field>,
}

impl Entry {
    /// An entry stamped with the current local time and no source
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            message: message.into(),
            source: None,
            fields: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    pub fn push_fields(&mut self, fields: impl IntoIterator<Item = Field>) {
        self.fields.extend(fields);
    }

    /// Turn loose arguments into fields
    ///
    /// A nested field value is taken as the field itself. A string followed
    /// by another argument is a key for that argument. Anything else, and a
    /// string with nothing after it, is kept under [`BAD_FIELDS_KEY`].
    pub fn push_args(&mut self, args: impl IntoIterator<Item = FieldValue>) {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let field = match arg {
                FieldValue::Field(field) => *field,
                FieldValue::Str(key) => match args.next() {
                    Some(value) => Field::new(key, value),
                    None => Field::new(BAD_FIELDS_KEY, key),
                },
                other => Field::new(BAD_FIELDS_KEY, other),
            };
            self.fields.push(field);
        }
    }

    /// `file:line` of the call site, or [`UNKNOWN_FILE`]`:0`
    pub fn source_string(&self) -> String {
        match &self.source {
            Some(source) => source.to_string(),
            None => format!("{UNKNOWN_FILE}:0"),
        }
    }
}

/// Build a `Vec<FieldValue>` of loose arguments for
/// [`Logger::log_args`](crate::Logger::log_args)
///
/// ```
/// let args = gslog::args!["user", "alice", "attempt", 3];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::FieldValue::from($arg)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_source() {
        let source = Source::caller();
        assert!(source.file.ends_with("entry.rs"));
        assert!(source.line > 0);
    }

    #[test]
    fn test_push_args_pairs() {
        let mut entry = Entry::new(Level::Info, "login");
        entry.push_args(crate::args!["user", "alice", "attempt", 3]);

        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.fields[0].to_string(), "user=alice");
        assert_eq!(entry.fields[1].to_string(), "attempt=3");
    }

    #[test]
    fn test_push_args_field_passthrough() {
        let mut entry = Entry::new(Level::Info, "m");
        entry.push_args(crate::args![Field::bool("ok", true), "k", "v"]);

        assert_eq!(entry.fields[0], Field::bool("ok", true));
        assert_eq!(entry.fields[1].to_string(), "k=v");
    }

    #[test]
    fn test_push_args_bad_keys() {
        let mut entry = Entry::new(Level::Info, "m");
        entry.push_args(crate::args![42, "dangling"]);

        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.fields[0].to_string(), "!badFieldsKey=42");
        assert_eq!(entry.fields[1].to_string(), "!badFieldsKey=dangling");
    }

    #[test]
    fn test_source_string() {
        let entry = Entry::new(Level::Warn, "m");
        assert_eq!(entry.source_string(), "!unknownFile:0");

        let entry = entry.with_source(Source {
            file: "src/main.rs",
            line: 12,
        });
        assert_eq!(entry.source_string(), "src/main.rs:12");
    }
}
