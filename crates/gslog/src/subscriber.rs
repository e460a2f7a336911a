//! `tracing` bootstrap writing through a rotating file
//!
//! For applications that log with the `tracing` macros but want gslog's
//! size-based rotation and retention underneath.
//!
//! ```no_run
//! use gslog::subscriber::TracingBuilder;
//! use gslog::{Level, RotatingFileConfig};
//!
//! let file = TracingBuilder::new()
//!     .with_level(Level::Debug)
//!     .with_file(RotatingFileConfig::new("/var/log/app/app.log").with_compress(true))
//!     .json(true)
//!     .init();
//!
//! tracing::info!(port = 8080, "listening");
//! if let Some(file) = file {
//!     let _ = file.close();
//! }
//! ```

use std::sync::Arc;

use gslog_rotate::{RotatingFile, RotatingFileConfig};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::{LogError, Result};
use crate::level::Level;

/// A boxed subscriber, ready to install globally or scope with
/// `tracing::subscriber::with_default`
pub type BoxedSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Builder for a `tracing` subscriber with optional rotating file output
///
/// Without a file, events go to stderr.
#[derive(Debug, Clone)]
pub struct TracingBuilder {
    level: Level,
    file: Option<RotatingFileConfig>,
    json: bool,
    from_env: bool,
}

impl Default for TracingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingBuilder {
    /// Info level text output to stderr, `RUST_LOG` honoured
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            file: None,
            json: false,
            from_env: true,
        }
    }

    /// Set the default level (overridden by `RUST_LOG` unless disabled)
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Write events to a rotating file
    pub fn with_file(mut self, file: RotatingFileConfig) -> Self {
        self.file = Some(file);
        self
    }

    /// Emit JSON lines instead of text
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Whether `RUST_LOG` may override the level
    pub fn from_env(mut self, from_env: bool) -> Self {
        self.from_env = from_env;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let default = self.level.as_tracing().as_str().to_ascii_lowercase();
        if self.from_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default))
        } else {
            EnvFilter::new(&default)
        }
    }

    /// Build the subscriber without installing it
    ///
    /// Returns the rotating file backing it, if one was configured.
    pub fn finish(self) -> (BoxedSubscriber, Option<Arc<RotatingFile>>) {
        let registry = Registry::default().with(self.env_filter());

        match self.file {
            Some(config) => {
                let file = Arc::new(RotatingFile::new(config));
                let layer = fmt_layer(self.json, Arc::clone(&file));
                (Box::new(registry.with(layer)), Some(file))
            }
            None => {
                let layer = fmt_layer(self.json, std::io::stderr);
                (Box::new(registry.with(layer)), None)
            }
        }
    }

    /// Install globally
    ///
    /// Fails with [`LogError::Subscriber`] if a global subscriber is
    /// already set.
    pub fn try_init(self) -> Result<Option<Arc<RotatingFile>>> {
        let (subscriber, file) = self.finish();
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| LogError::subscriber(e.to_string()))?;
        Ok(file)
    }

    /// Install globally, printing a warning if a subscriber is already set
    pub fn init(self) -> Option<Arc<RotatingFile>> {
        match self.try_init() {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Warning: Failed to initialize tracing subscriber: {}", e);
                None
            }
        }
    }
}

fn fmt_layer<S, W>(json: bool, writer: W) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn builder(dir: &std::path::Path) -> TracingBuilder {
        TracingBuilder::new()
            .from_env(false)
            .with_file(RotatingFileConfig::new(dir.join("trace.log")).with_max_size_mb(1))
    }

    #[test]
    fn test_text_events_reach_file() {
        let dir = tempfile::tempdir().unwrap();
        let (subscriber, file) = builder(dir.path()).finish();
        let file = file.unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(peer = "a", "connected");
            tracing::debug!("filtered out");
        });

        let contents = fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("connected"));
        assert!(contents.contains("peer=\"a\""));
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn test_json_events_reach_file() {
        let dir = tempfile::tempdir().unwrap();
        let (subscriber, file) = builder(dir.path())
            .with_level(Level::Debug)
            .json(true)
            .finish();
        let file = file.unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(attempt = 2, "retrying");
        });

        let contents = fs::read_to_string(file.path()).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(line["level"], "DEBUG");
        assert_eq!(line["fields"]["message"], "retrying");
        assert_eq!(line["fields"]["attempt"], 2);
    }

    #[test]
    fn test_fatal_level_maps_to_error() {
        let dir = tempfile::tempdir().unwrap();
        let (subscriber, file) = builder(dir.path()).with_level(Level::Fatal).finish();
        let file = file.unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("quiet");
            tracing::error!("loud");
        });

        let contents = fs::read_to_string(file.path()).unwrap();
        assert!(!contents.contains("quiet"));
        assert!(contents.contains("loud"));
    }

    #[test]
    fn test_stderr_without_file() {
        let (_subscriber, file) = TracingBuilder::new().from_env(false).finish();
        assert!(file.is_none());
    }
}
