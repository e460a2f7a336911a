//! Configuration for a rotating log file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default maximum size of the active file, in megabytes
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const MEGABYTE: u64 = 1024 * 1024;

/// Static configuration of a [`RotatingFile`](crate::RotatingFile)
///
/// A zero value for `max_size_mb` means the default (100 MB). Zero for
/// `max_backups` or `max_age_days` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatingFileConfig {
    /// Active log file. Empty means `<temp_dir>/<process-name>-gslog.log`.
    pub path: PathBuf,
    /// Maximum size of the active file in megabytes before it is rotated
    pub max_size_mb: u64,
    /// Maximum number of backups to keep
    pub max_backups: usize,
    /// Maximum age of a backup in days, by the timestamp in its name
    pub max_age_days: u64,
    /// Gzip backups during the retention pass
    pub compress: bool,
}

impl Default for RotatingFileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_backups: 0,
            max_age_days: 0,
            compress: false,
        }
    }
}

impl RotatingFileConfig {
    /// Create a config for the given active file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the maximum active file size in megabytes
    pub fn with_max_size_mb(mut self, max_size_mb: u64) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    /// Set the maximum number of backups kept
    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    /// Set the maximum backup age in days
    pub fn with_max_age_days(mut self, max_age_days: u64) -> Self {
        self.max_age_days = max_age_days;
        self
    }

    /// Enable or disable gzip compression of backups
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Maximum active file size in bytes
    pub fn max_size_bytes(&self) -> u64 {
        let mb = if self.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        mb.saturating_mul(MEGABYTE)
    }

    /// The active file path, falling back to the temp directory default
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.as_os_str().is_empty() {
            default_path()
        } else {
            self.path.clone()
        }
    }
}

fn default_path() -> PathBuf {
    let process = std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "gslog".to_string());

    std::env::temp_dir().join(format!("{process}-gslog.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RotatingFileConfig::default();
        assert_eq!(config.max_size_mb, 100);
        assert_eq!(config.max_backups, 0);
        assert_eq!(config.max_age_days, 0);
        assert!(!config.compress);
        assert_eq!(config.max_size_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn test_zero_size_means_default() {
        let config = RotatingFileConfig::new("/var/log/app.log").with_max_size_mb(0);
        assert_eq!(config.max_size_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn test_builder() {
        let config = RotatingFileConfig::new("/var/log/app.log")
            .with_max_size_mb(5)
            .with_max_backups(3)
            .with_max_age_days(7)
            .with_compress(true);

        assert_eq!(config.path, PathBuf::from("/var/log/app.log"));
        assert_eq!(config.max_size_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.max_backups, 3);
        assert_eq!(config.max_age_days, 7);
        assert!(config.compress);
    }

    #[test]
    fn test_empty_path_uses_temp_dir() {
        let path = RotatingFileConfig::default().resolved_path();
        assert!(path.starts_with(std::env::temp_dir()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-gslog.log"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: RotatingFileConfig =
            serde_json::from_str(r#"{"path": "/tmp/x.log", "compress": true}"#).unwrap();
        assert_eq!(config.max_size_mb, 100);
        assert!(config.compress);
        assert_eq!(config.resolved_path(), PathBuf::from("/tmp/x.log"));
    }
}
