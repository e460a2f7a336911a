//! Handlers turn entries into bytes on a sink
//!
//! [`TextHandler`] renders human-readable lines, [`JsonHandler`] one JSON
//! object per line. Both filter by level, serialize writes to their sink and
//! forward `sync` / `close`.

mod json;
mod text;

pub use json::JsonHandler;
pub use text::TextHandler;

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::entry::Entry;
use crate::error::Result;
use crate::level::Level;
use crate::options::{DEFAULT_TIME_LAYOUT, HandlerOptions};
use crate::sink::WriteSyncer;

/// Receives entries from a [`Logger`](crate::Logger)
pub trait Handler: Send + Sync {
    /// Whether entries at `level` would be written
    fn enabled(&self, level: Level) -> bool;

    /// Render and write one entry
    fn handle(&self, entry: &Entry) -> Result<()>;

    /// Flush the sink
    fn sync(&self) -> Result<()>;

    /// Close the sink
    fn close(&self) -> Result<()>;
}

/// Sink and options shared by the concrete handlers
pub(crate) struct HandlerCore {
    sink: Mutex<Box<dyn WriteSyncer>>,
    options: RwLock<HandlerOptions>,
}

impl HandlerCore {
    pub(crate) fn new(sink: impl WriteSyncer + 'static, options: HandlerOptions) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            options: RwLock::new(options),
        }
    }

    pub(crate) fn options(&self) -> RwLockReadGuard<'_, HandlerOptions> {
        self.options.read()
    }

    pub(crate) fn set_options(&self, options: HandlerOptions) {
        *self.options.write() = options;
    }

    pub(crate) fn enabled(&self, level: Level) -> bool {
        level >= self.options.read().level
    }

    pub(crate) fn write(&self, line: &[u8]) -> Result<()> {
        self.sink.lock().write(line)?;
        Ok(())
    }

    pub(crate) fn sync(&self) -> Result<()> {
        self.sink.lock().sync()
    }

    pub(crate) fn close(&self) -> Result<()> {
        self.sink.lock().close()
    }
}

impl fmt::Debug for HandlerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCore")
            .field("options", &*self.options.read())
            .finish_non_exhaustive()
    }
}

/// Format `time` with `layout`, falling back to the default layout if
/// `layout` contains specifiers `chrono` cannot render
pub(crate) fn format_time(time: &DateTime<Local>, layout: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", time.format(layout)).is_err() {
        out.clear();
        let _ = write!(out, "{}", time.format(DEFAULT_TIME_LAYOUT));
    }
    out
}
