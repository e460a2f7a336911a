//! Backup file naming and discovery
//!
//! A backup of `<dir>/<base><ext>` is named
//! `<dir>/<base>_<YYYY-MM-DDTHH-MM-SS.mmm><ext>`, optionally followed by
//! `.gz` once compressed. The timestamp is the rotation time in UTC.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// `chrono` format of the timestamp embedded in backup names
pub const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Suffix appended to compressed backups
pub const COMPRESS_SUFFIX: &str = ".gz";

/// Split an active file path into (directory, `<base>_` prefix, extension)
pub fn backup_parts(path: &Path) -> (PathBuf, String, String) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (dir, format!("{base}_"), ext)
}

/// Backup path for `path` rotated at `at`
pub fn backup_name(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let (dir, prefix, ext) = backup_parts(path);
    dir.join(format!("{prefix}{}{ext}", at.format(BACKUP_TIME_FORMAT)))
}

/// Backup path for `path` that does not exist yet
///
/// Two rotations within the same millisecond would collide, so the
/// timestamp is advanced one millisecond at a time until the name is free.
pub(crate) fn unused_backup_name(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut at = at;
    loop {
        let candidate = backup_name(path, at);
        let compressed = append_suffix(&candidate, COMPRESS_SUFFIX);
        if !candidate.exists() && !compressed.exists() {
            return candidate;
        }
        at += TimeDelta::milliseconds(1);
    }
}

/// Parse the timestamp out of a backup file name
///
/// Returns the timestamp and whether the name carries the `.gz` suffix, or
/// `None` if the name is not `<prefix><timestamp><ext>[.gz]`.
pub fn parse_backup_time(file_name: &str, prefix: &str, ext: &str) -> Option<(NaiveDateTime, bool)> {
    let (name, compressed) = match file_name.strip_suffix(COMPRESS_SUFFIX) {
        Some(stripped) if !ext.ends_with(COMPRESS_SUFFIX) => (stripped, true),
        _ => (file_name, false),
    };

    let stamp = name.strip_prefix(prefix)?.strip_suffix(ext)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT)
        .ok()
        .map(|ts| (ts, compressed))
}

pub(crate) fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

/// Snapshot of one backup file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Full path of the backup
    pub path: PathBuf,
    /// Rotation time parsed from the file name
    pub timestamp: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
    /// Unix permission bits (0 where unsupported)
    pub mode: u32,
    /// Last modification time, if the platform reports it
    pub modified: Option<SystemTime>,
    /// Whether the backup is already gzipped
    pub compressed: bool,
}

impl FileMeta {
    /// File name component of the backup
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Find every backup of the file `<prefix><ext>` in `dir`, newest first
///
/// Files whose names do not parse are ignored, which includes the active
/// file itself. A missing directory yields an empty list.
pub fn scan_backups(dir: &Path, prefix: &str, ext: &str) -> io::Result<Vec<FileMeta>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        // entries may vanish between listing and stat
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some((timestamp, compressed)) = parse_backup_time(file_name, prefix, ext) else {
            continue;
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if !metadata.is_file() {
            continue;
        }

        files.push(FileMeta {
            path: entry.path(),
            timestamp: timestamp.and_utc(),
            size: metadata.len(),
            mode: file_mode(&metadata),
            modified: metadata.modified().ok(),
            compressed,
        });
    }

    files.sort_by(newest_first);
    Ok(files)
}

/// Order backups newest first, ties broken by path
pub fn newest_first(a: &FileMeta, b: &FileMeta) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.path.cmp(&a.path))
}

#[cfg(unix)]
pub(crate) fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub(crate) fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap() + TimeDelta::milliseconds(ms)
    }

    #[test]
    fn test_backup_name_format() {
        let name = backup_name(Path::new("/var/log/app.log"), at(2024, 6, 11, 10, 0, 5, 42));
        assert_eq!(name, PathBuf::from("/var/log/app_2024-06-11T10-00-05.042.log"));
    }

    #[test]
    fn test_backup_name_without_extension() {
        let name = backup_name(Path::new("/var/log/app"), at(2024, 1, 2, 3, 4, 5, 6));
        assert_eq!(name, PathBuf::from("/var/log/app_2024-01-02T03-04-05.006"));
    }

    #[test]
    fn test_backup_name_relative_path() {
        let name = backup_name(Path::new("app.log"), at(2024, 1, 2, 3, 4, 5, 0));
        assert_eq!(name, PathBuf::from("./app_2024-01-02T03-04-05.000.log"));
    }

    #[test]
    fn test_parse_backup_time() {
        let (ts, compressed) =
            parse_backup_time("app_2024-06-11T10-00-05.042.log", "app_", ".log").unwrap();
        assert_eq!(ts.and_utc(), at(2024, 6, 11, 10, 0, 5, 42));
        assert!(!compressed);
    }

    #[test]
    fn test_parse_compressed_backup_time() {
        let (ts, compressed) =
            parse_backup_time("app_2024-06-11T10-00-05.042.log.gz", "app_", ".log").unwrap();
        assert_eq!(ts.and_utc(), at(2024, 6, 11, 10, 0, 5, 42));
        assert!(compressed);
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert!(parse_backup_time("app.log", "app_", ".log").is_none());
        assert!(parse_backup_time("other_2024-06-11T10-00-05.042.log", "app_", ".log").is_none());
        assert!(parse_backup_time("app_2024-06-11T10-00-05.042.txt", "app_", ".log").is_none());
        assert!(parse_backup_time("app_not-a-time.log", "app_", ".log").is_none());
    }

    #[test]
    fn test_name_round_trips_through_parser() {
        let path = Path::new("/logs/server.jsonl");
        let when = at(2030, 12, 31, 23, 59, 59, 999);
        let backup = backup_name(path, when);
        let (_, prefix, ext) = backup_parts(path);

        let file_name = backup.file_name().unwrap().to_str().unwrap();
        let (ts, _) = parse_backup_time(file_name, &prefix, &ext).unwrap();
        assert_eq!(ts.and_utc(), when);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = scan_backups(&dir.path().join("nope"), "app_", ".log").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_sorts_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let active = dir.path().join("app.log");
        fs::write(&active, b"active").unwrap();
        fs::write(dir.path().join("unrelated.txt"), b"x").unwrap();

        let old = backup_name(&active, at(2024, 1, 1, 0, 0, 0, 0));
        let mid = backup_name(&active, at(2024, 1, 2, 0, 0, 0, 0));
        let new = backup_name(&active, at(2024, 1, 3, 0, 0, 0, 0));
        fs::write(&mid, b"mid").unwrap();
        fs::write(&old, b"old").unwrap();
        fs::write(append_suffix(&new, COMPRESS_SUFFIX), b"new").unwrap();

        let files = scan_backups(dir.path(), "app_", ".log").unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].timestamp, at(2024, 1, 3, 0, 0, 0, 0));
        assert!(files[0].compressed);
        assert_eq!(files[1].path, mid);
        assert_eq!(files[1].size, 3);
        assert_eq!(files[2].path, old);
    }

    #[test]
    fn test_unused_backup_name_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        let active = dir.path().join("app.log");
        let when = at(2024, 5, 5, 5, 5, 5, 500);

        let first = unused_backup_name(&active, when);
        fs::write(&first, b"taken").unwrap();
        let second = unused_backup_name(&active, when);

        assert_ne!(first, second);
        assert_eq!(second, backup_name(&active, when + TimeDelta::milliseconds(1)));
    }
}
