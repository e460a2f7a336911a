use std::fmt::Write as _;

use crate::entry::{Entry, UNKNOWN_FILE};
use crate::error::Result;
use crate::level::Level;
use crate::options::{HandlerOptions, TextFlags};
use crate::sink::WriteSyncer;

use super::{Handler, HandlerCore, format_time};

/// Renders entries as single text lines
///
/// ```text
/// <prefix> 2024/06/11 10:00:00.000000 [Info] src/main.rs:12 listening port=8080
/// ```
///
/// Which parts appear is controlled by [`TextFlags`].
#[derive(Debug)]
pub struct TextHandler {
    core: HandlerCore,
}

impl TextHandler {
    pub fn new(sink: impl WriteSyncer + 'static, options: HandlerOptions) -> Self {
        Self {
            core: HandlerCore::new(sink, options),
        }
    }

    pub fn options(&self) -> HandlerOptions {
        self.core.options().clone()
    }

    /// Replace the options; applies to the next entry
    pub fn set_options(&self, options: HandlerOptions) {
        self.core.set_options(options);
    }

    /// The line `handle` would write for `entry`, newline included
    pub fn format(&self, entry: &Entry) -> String {
        let options = self.core.options();
        let flags = options.text.flags;
        let mut line = String::with_capacity(128);

        if !options.text.prefix.is_empty() {
            let _ = write!(line, "<{}> ", options.text.prefix);
        }
        if flags.contains(TextFlags::TIME) {
            line.push_str(&format_time(&entry.time, &options.time_layout));
            line.push(' ');
        }
        if let Some(level) = flags.level_str(entry.level) {
            let _ = write!(line, "[{level}] ");
        }
        if flags.contains(TextFlags::FILE) {
            match &entry.source {
                Some(source) => {
                    let _ = write!(line, "{source} ");
                }
                None => {
                    let _ = write!(line, "{UNKNOWN_FILE}:0 ");
                }
            }
        }
        line.push_str(&entry.message);
        for field in &entry.fields {
            let _ = write!(line, " {field}");
        }
        line.push('\n');
        line
    }
}

impl Handler for TextHandler {
    fn enabled(&self, level: Level) -> bool {
        self.core.enabled(level)
    }

    fn handle(&self, entry: &Entry) -> Result<()> {
        let line = self.format(entry);
        self.core.write(line.as_bytes())
    }

    fn sync(&self) -> Result<()> {
        self.core.sync()
    }

    fn close(&self) -> Result<()> {
        self.core.close()
    }
}
