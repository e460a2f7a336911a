//! The logger front end

use std::fmt;
use std::sync::Arc;

use crate::entry::{Entry, Source};
use crate::error::Result;
use crate::field::Field;
use crate::handler::Handler;
use crate::level::Level;
use crate::value::FieldValue;

/// Builds entries and passes them to a [`Handler`]
///
/// Every logging method records its call site. Handler errors on the
/// logging path are dropped; [`sync`](Self::sync) and
/// [`close`](Self::close) report them.
///
/// # Example
///
/// ```
/// use gslog::{Field, HandlerOptions, Logger, MemorySink, TextHandler};
///
/// let sink = MemorySink::new();
/// let logger = Logger::new(TextHandler::new(sink.clone(), HandlerOptions::default()));
///
/// logger.info("listening", &[Field::int("port", 8080)]);
/// assert!(sink.contents().contains("listening port=8080"));
/// ```
#[derive(Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
}

impl Logger {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// A logger over an already shared handler
    pub fn from_shared(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if !self.enabled(level) {
            return;
        }
        let mut entry = Entry::new(level, message).with_source(Source::caller());
        entry.push_fields(fields.iter().cloned());
        let _ = self.handler.handle(&entry);
    }

    /// Log with loose arguments, see [`Entry::push_args`]
    #[track_caller]
    pub fn log_args(&self, level: Level, message: &str, args: impl IntoIterator<Item = FieldValue>) {
        if !self.enabled(level) {
            return;
        }
        let mut entry = Entry::new(level, message).with_source(Source::caller());
        entry.push_args(args);
        let _ = self.handler.handle(&entry);
    }

    #[track_caller]
    pub fn trace(&self, message: &str, fields: &[Field]) {
        self.log(Level::Trace, message, fields);
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }

    /// Log at panic level; does not panic
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) {
        self.log(Level::Panic, message, fields);
    }

    /// Log at fatal level; does not exit
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) {
        self.log(Level::Fatal, message, fields);
    }

    pub fn sync(&self) -> Result<()> {
        self.handler.sync()
    }

    pub fn close(&self) -> Result<()> {
        self.handler.close()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::TextHandler;
    use crate::options::{HandlerOptions, TextFlags};
    use crate::sink::MemorySink;

    fn logger(level: Level, flags: TextFlags) -> (Logger, MemorySink) {
        let sink = MemorySink::new();
        let options = HandlerOptions::default()
            .with_level(level)
            .with_text_flags(flags);
        (Logger::new(TextHandler::new(sink.clone(), options)), sink)
    }

    #[test]
    fn test_level_methods() {
        let (logger, sink) = logger(Level::Trace, TextFlags::LEVEL_LOWER);

        logger.trace("t", &[]);
        logger.debug("d", &[]);
        logger.info("i", &[]);
        logger.warn("w", &[]);
        logger.error("e", &[]);
        logger.panic("p", &[]);
        logger.fatal("f", &[]);

        assert_eq!(
            sink.lines(),
            vec![
                "[trace] t",
                "[debug] d",
                "[info] i",
                "[warn] w",
                "[error] e",
                "[panic] p",
                "[fatal] f"
            ]
        );
    }

    #[test]
    fn test_filtered_below_level() {
        let (logger, sink) = logger(Level::Warn, TextFlags::empty());

        logger.info("dropped", &[]);
        logger.warn("kept", &[Field::uint("n", 1u8)]);

        assert_eq!(sink.lines(), vec!["kept n=1"]);
        assert!(!logger.enabled(Level::Debug));
    }

    #[test]
    fn test_records_call_site() {
        let (logger, sink) = logger(Level::Info, TextFlags::FILE);
        let line = line!() + 1;
        logger.info("here", &[]);

        assert_eq!(sink.contents(), format!("{}:{line} here\n", file!()));
    }

    #[test]
    fn test_log_args() {
        let (logger, sink) = logger(Level::Info, TextFlags::empty());
        logger.log_args(Level::Info, "login", crate::args!["user", "alice", "ok"]);

        assert_eq!(sink.lines(), vec!["login user=alice !badFieldsKey=ok"]);
    }

    #[test]
    fn test_handler_errors_surface_on_close_only() {
        let (logger, sink) = logger(Level::Info, TextFlags::empty());
        logger.close().unwrap();
        assert!(sink.is_closed());

        // swallowed
        logger.info("after close", &[]);
        assert!(sink.contents().is_empty());
        logger.sync().unwrap();
    }
}
