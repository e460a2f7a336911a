//! Process-wide default logger
//!
//! Nothing is installed until [`install`] is called. While the slot is
//! empty the forwarding functions do nothing.
//!
//! ```
//! use std::sync::Arc;
//! use gslog::{global, HandlerOptions, Logger, MemorySink, TextHandler};
//!
//! let sink = MemorySink::new();
//! global::install(Arc::new(Logger::new(TextHandler::new(sink.clone(), HandlerOptions::default()))));
//! global::info("ready", &[]);
//! global::uninstall();
//! assert!(sink.contents().contains("ready"));
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::field::Field;
use crate::level::Level;
use crate::logger::Logger;
use crate::value::FieldValue;

static DEFAULT: RwLock<Option<Arc<Logger>>> = parking_lot::const_rwlock(None);

/// Install `logger` as the default, returning the one it replaces
pub fn install(logger: Arc<Logger>) -> Option<Arc<Logger>> {
    DEFAULT.write().replace(logger)
}

/// The installed default, if any
pub fn current() -> Option<Arc<Logger>> {
    DEFAULT.read().clone()
}

/// Remove the default, returning it
pub fn uninstall() -> Option<Arc<Logger>> {
    DEFAULT.write().take()
}

#[track_caller]
pub fn log(level: Level, message: &str, fields: &[Field]) {
    if let Some(logger) = current() {
        logger.log(level, message, fields);
    }
}

#[track_caller]
pub fn log_args(level: Level, message: &str, args: impl IntoIterator<Item = FieldValue>) {
    if let Some(logger) = current() {
        logger.log_args(level, message, args);
    }
}

#[track_caller]
pub fn trace(message: &str, fields: &[Field]) {
    log(Level::Trace, message, fields);
}

#[track_caller]
pub fn debug(message: &str, fields: &[Field]) {
    log(Level::Debug, message, fields);
}

#[track_caller]
pub fn info(message: &str, fields: &[Field]) {
    log(Level::Info, message, fields);
}

#[track_caller]
pub fn warn(message: &str, fields: &[Field]) {
    log(Level::Warn, message, fields);
}

#[track_caller]
pub fn error(message: &str, fields: &[Field]) {
    log(Level::Error, message, fields);
}

#[track_caller]
pub fn panic(message: &str, fields: &[Field]) {
    log(Level::Panic, message, fields);
}

#[track_caller]
pub fn fatal(message: &str, fields: &[Field]) {
    log(Level::Fatal, message, fields);
}

/// Sync the default logger; a no-op when none is installed
pub fn sync() -> Result<()> {
    match current() {
        Some(logger) => logger.sync(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::TextHandler;
    use crate::options::{HandlerOptions, TextFlags};
    use crate::sink::MemorySink;

    // the slot is process-wide, so everything touching it lives in one test
    #[test]
    fn test_install_swap_uninstall() {
        uninstall();
        info("nobody listening", &[]);
        assert!(current().is_none());
        sync().unwrap();

        let options = HandlerOptions::default().with_text_flags(TextFlags::FILE);
        let first = MemorySink::new();
        let second = MemorySink::new();

        let previous = install(Arc::new(Logger::new(TextHandler::new(first.clone(), options.clone()))));
        assert!(previous.is_none());
        let line = line!() + 1;
        warn("to first", &[]);

        let previous = install(Arc::new(Logger::new(TextHandler::new(second.clone(), options))));
        assert!(previous.is_some());
        log_args(Level::Error, "to second", crate::args!["code", 7]);

        assert!(uninstall().is_some());
        debug("dropped", &[]);

        assert_eq!(first.contents(), format!("{}:{line} to first\n", file!()));
        assert!(second.contents().ends_with("to second code=7\n"));
    }
}
