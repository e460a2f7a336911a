//! Logger configuration

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use gslog_rotate::{RotatingFile, RotatingFileConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::handler::{JsonHandler, TextHandler};
use crate::level::Level;
use crate::logger::Logger;
use crate::options::HandlerOptions;
use crate::sink::WriteSyncer;

/// Line format of a logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Where a logger writes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    #[default]
    Stdout,
    Stderr,
    /// A size-rotated file
    File(RotatingFileConfig),
}

/// Main logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level written; overrides `options.level`
    pub level: Level,
    pub format: Format,
    pub output: Output,
    pub options: HandlerOptions,
}

impl LogConfig {
    /// Create a config for development (debug text on stdout)
    pub fn development() -> Self {
        Self {
            level: Level::Debug,
            format: Format::Text,
            output: Output::Stdout,
            ..Default::default()
        }
    }

    /// Create a config for production (info JSON lines to a rotated,
    /// compressed file under `log_dir`)
    pub fn production(log_dir: impl Into<PathBuf>) -> Self {
        let path = log_dir.into().join("gslog.log");
        Self {
            level: Level::Info,
            format: Format::Json,
            output: Output::File(
                RotatingFileConfig::new(path)
                    .with_max_size_mb(100)
                    .with_max_backups(30)
                    .with_max_age_days(30)
                    .with_compress(true),
            ),
            ..Default::default()
        }
    }

    /// Create a config for testing (warnings and above on stderr)
    pub fn testing() -> Self {
        Self {
            level: Level::Warn,
            format: Format::Text,
            output: Output::Stderr,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Write to a rotating file
    pub fn with_file(self, file: RotatingFileConfig) -> Self {
        self.with_output(Output::File(file))
    }

    pub fn with_options(mut self, options: HandlerOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a logger from this configuration
    ///
    /// File output is opened lazily on the first entry.
    pub fn build(&self) -> Result<Logger> {
        let options = self.options.clone().with_level(self.level);
        options.validate()?;

        let sink: Box<dyn WriteSyncer> = match &self.output {
            Output::Stdout => Box::new(io::stdout()),
            Output::Stderr => Box::new(io::stderr()),
            Output::File(file) => Box::new(Arc::new(RotatingFile::new(file.clone()))),
        };

        Ok(match self.format {
            Format::Text => Logger::new(TextHandler::new(sink, options)),
            Format::Json => Logger::new(JsonHandler::new(sink, options)),
        })
    }
}
