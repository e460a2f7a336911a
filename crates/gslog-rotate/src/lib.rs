//! Size-based rotating log file writer for gslog
//!
//! [`RotatingFile`] appends bytes to a single active file and rotates it
//! once the next write would push it past a configured size. Rotated
//! backups are renamed with their rotation time in UTC, then pruned by count
//! and age and optionally gzipped by a background worker that never blocks
//! the write path.
//!
//! # Features
//!
//! - **Lazy open**: nothing touches the filesystem until the first write
//! - **Resume**: an existing active file is appended to if it has room
//! - **Retention**: keep the newest `max_backups`, drop anything older than
//!   `max_age_days`
//! - **Compression**: surviving backups become `<name>.gz`
//! - **tracing integration**: `RotatingFile` and `Arc<RotatingFile>` are
//!   `MakeWriter`s for `tracing-subscriber`'s fmt layer
//!
//! # Quick Start
//!
//! ```no_run
//! use gslog_rotate::{RotatingFile, RotatingFileConfig};
//!
//! let file = RotatingFile::new(
//!     RotatingFileConfig::new("/var/log/app/app.log")
//!         .with_max_size_mb(50)
//!         .with_max_backups(10)
//!         .with_max_age_days(30)
//!         .with_compress(true),
//! );
//!
//! file.write(b"service started\n")?;
//! file.close()?;
//! # Ok::<(), gslog_rotate::RotateError>(())
//! ```
//!
//! # Backup layout
//!
//! ```text
//! /var/log/app/app.log                              active
//! /var/log/app/app_2024-06-11T10-00-05.042.log      backup
//! /var/log/app/app_2024-06-10T08-12-44.917.log.gz   compressed backup
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod retention;
mod worker;
pub mod writer;

pub use backup::{FileMeta, backup_name, parse_backup_time, scan_backups};
pub use config::{DEFAULT_MAX_SIZE_MB, RotatingFileConfig};
pub use error::{Result, RetentionAction, RetentionErrors, RetentionFailure, RotateError};
pub use retention::{RetentionPlan, RetentionPolicy, RetentionReport};
pub use writer::RotatingFile;
