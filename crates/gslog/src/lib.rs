//! Leveled, field-based structured logging
//!
//! gslog renders log entries through pluggable handlers onto pluggable
//! sinks. The sink that matters most is [`RotatingFile`], a size-rotated
//! log file whose backups are pruned and compressed in the background.
//!
//! # Features
//!
//! - **Typed fields**: [`Field`] values are a closed [`FieldValue`] enum
//!   with checked accessors
//! - **Text and JSON**: [`TextHandler`] for humans, [`JsonHandler`] for
//!   log aggregation
//! - **Rotating files**: size threshold, max backups, max age, gzip
//! - **Explicit default logger**: [`global`] is empty until installed
//! - **tracing bootstrap**: [`subscriber::TracingBuilder`] sends `tracing`
//!   events through the same rotating file
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gslog::{Field, LogConfig, global};
//!
//! let logger = LogConfig::production("/var/log/app").build()?;
//! global::install(Arc::new(logger));
//!
//! global::info("service started", &[Field::int("port", 8080)]);
//! global::sync()?;
//! # Ok::<(), gslog::LogError>(())
//! ```
//!
//! # Loose arguments
//!
//! ```
//! use gslog::{args, HandlerOptions, Level, Logger, MemorySink, TextFlags, TextHandler};
//!
//! let sink = MemorySink::new();
//! let options = HandlerOptions::default().with_text_flags(TextFlags::empty());
//! let logger = Logger::new(TextHandler::new(sink.clone(), options));
//!
//! logger.log_args(Level::Info, "login", args!["user", "alice", "attempt", 2]);
//! assert_eq!(sink.contents(), "login user=alice attempt=2\n");
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod field;
pub mod global;
pub mod handler;
pub mod level;
pub mod logger;
pub mod options;
pub mod sink;
pub mod subscriber;
pub mod value;

pub use config::{Format, LogConfig, Output};
pub use entry::{BAD_FIELDS_KEY, Entry, Source, UNKNOWN_FILE};
pub use error::{LogError, Result};
pub use field::Field;
pub use handler::{Handler, JsonHandler, TextHandler};
pub use level::Level;
pub use logger::Logger;
pub use options::{DEFAULT_TIME_LAYOUT, HandlerOptions, JsonKeys, TextFlags, TextOptions};
pub use sink::{MemorySink, WriteSyncer};
pub use value::{FieldValue, Kind};

pub use gslog_rotate::{RotateError, RotatingFile, RotatingFileConfig};
