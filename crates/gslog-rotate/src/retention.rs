//! Backup retention: which backups to delete and which to compress
//!
//! [`plan`] is pure decision logic over a list of [`FileMeta`]. [`run`]
//! scans a directory, applies the plan and reports what it did. Failures on
//! individual files are collected rather than aborting the pass.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::backup::{self, COMPRESS_SUFFIX, FileMeta};
use crate::error::{RetentionAction, RetentionErrors};

/// Limits applied to the backups of one rotating file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    /// Keep at most this many backups (0 = unlimited)
    pub max_backups: usize,
    /// Remove backups older than this many days (0 = unlimited)
    pub max_age_days: u64,
    /// Gzip the backups that are kept
    pub compress: bool,
}

impl RetentionPolicy {
    /// Create a policy
    pub fn new(max_backups: usize, max_age_days: u64, compress: bool) -> Self {
        Self {
            max_backups,
            max_age_days,
            compress,
        }
    }

    /// Whether a retention pass has nothing to do
    pub fn is_unbounded(&self) -> bool {
        self.max_backups == 0 && self.max_age_days == 0 && !self.compress
    }

    /// Oldest timestamp a backup may carry at `now`, if age is limited
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.max_age_days == 0 {
            return None;
        }
        let days = i64::try_from(self.max_age_days).unwrap_or(i64::MAX);
        let age = TimeDelta::try_days(days).unwrap_or(TimeDelta::MAX);
        Some(now.checked_sub_signed(age).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }
}

/// Outcome of applying a [`RetentionPolicy`] to a set of backups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Backups that survive, newest first
    pub keep: Vec<FileMeta>,
    /// Backups to delete
    pub remove: Vec<FileMeta>,
    /// Survivors that still need compressing
    pub compress: Vec<FileMeta>,
}

impl RetentionPlan {
    /// Survivors that are already gzipped
    pub fn already_compressed(&self) -> impl Iterator<Item = &FileMeta> {
        self.keep.iter().filter(|f| f.compressed)
    }
}

/// Decide which backups to keep, remove and compress
///
/// `files` may be in any order; they are sorted newest first. The count and
/// age limits are applied independently and their removals unioned.
pub fn plan(mut files: Vec<FileMeta>, policy: &RetentionPolicy, now: DateTime<Utc>) -> RetentionPlan {
    files.sort_by(backup::newest_first);

    let cutoff = policy.cutoff(now);
    let mut result = RetentionPlan::default();

    for (position, file) in files.into_iter().enumerate() {
        let over_count = policy.max_backups > 0 && position >= policy.max_backups;
        let expired = cutoff.is_some_and(|cutoff| file.timestamp < cutoff);

        if over_count || expired {
            result.remove.push(file);
        } else {
            if policy.compress && !file.compressed {
                result.compress.push(file.clone());
            }
            result.keep.push(file);
        }
    }

    result
}

/// What a retention pass changed on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    /// Backups deleted
    pub removed: Vec<PathBuf>,
    /// Compressed archives written
    pub compressed: Vec<PathBuf>,
}

/// Run one retention pass over the backups of `active`
///
/// Returns the report when every file was processed, otherwise the joined
/// per-file failures. A failed file is reconsidered on the next pass.
pub fn run(
    active: &Path,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<RetentionReport, RetentionErrors> {
    let mut report = RetentionReport::default();
    if policy.is_unbounded() {
        return Ok(report);
    }

    let (dir, prefix, ext) = backup::backup_parts(active);
    let mut errors = RetentionErrors::new();

    let files = match backup::scan_backups(&dir, &prefix, &ext) {
        Ok(files) => files,
        Err(e) => {
            errors.push(dir, RetentionAction::Scan, e);
            return Err(errors);
        }
    };

    let plan = plan(files, policy, now);

    for file in &plan.remove {
        match fs::remove_file(&file.path) {
            Ok(()) => report.removed.push(file.path.clone()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => errors.push(file.path.clone(), RetentionAction::Remove, e),
        }
    }

    for file in &plan.compress {
        let target = backup::append_suffix(&file.path, COMPRESS_SUFFIX);
        match compress_file(&file.path, &target) {
            Ok(()) => report.compressed.push(target),
            Err(e) => errors.push(file.path.clone(), RetentionAction::Compress, e),
        }
    }

    debug!(
        removed = report.removed.len(),
        compressed = report.compressed.len(),
        failed = errors.len(),
        "Retention pass finished"
    );

    errors.into_result().map(|()| report)
}

/// Gzip `src` into `dst`, then delete `src`
///
/// `dst` gets the permission bits of `src`. A partially written `dst` is
/// removed if anything fails.
pub fn compress_file(src: &Path, dst: &Path) -> io::Result<()> {
    let result = write_gzip(src, dst);
    if result.is_err() {
        let _ = fs::remove_file(dst);
        return result;
    }
    fs::remove_file(src)
}

fn write_gzip(src: &Path, dst: &Path) -> io::Result<()> {
    let input = File::open(src)?;
    let metadata = input.metadata()?;

    let output = create_with_mode(dst, backup::file_mode(&metadata))?;
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut BufReader::new(input), &mut encoder)?;

    let mut writer = encoder.finish()?;
    writer.flush()?;
    let output = writer.into_inner().map_err(|e| e.into_error())?;
    output.sync_all()
}

fn create_with_mode(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if mode != 0 {
            options.mode(mode);
        }
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(path)
}
