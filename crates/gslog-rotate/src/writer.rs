//! The rotating file writer
//!
//! All mutating operations on a [`RotatingFile`] are serialized by one
//! mutex. Rotation (close, rename to a timestamped backup, create a fresh
//! file) happens inline on the write path; pruning and compression of
//! backups is handed to the background worker.
//!
//! Nothing in this module emits tracing events while the writer lock is
//! held: the file is commonly the destination of those same events, and the
//! lock is not reentrant. Diagnostics are gathered into [`Notes`] and
//! emitted after unlocking.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};
use tracing_subscriber::fmt::MakeWriter;

use crate::backup;
use crate::config::RotatingFileConfig;
use crate::error::{Result, RotateError};
use crate::retention::{self, RetentionPolicy, RetentionReport};
use crate::worker::{RetentionJob, RetentionWorker};

const DEFAULT_FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;

/// A log file that rotates itself once it reaches a maximum size
///
/// The file is opened lazily on the first [`write`](Self::write) or
/// [`rotate`](Self::rotate). Backups are named
/// `<base>_<YYYY-MM-DDTHH-MM-SS.mmm><ext>` next to the active file and are
/// pruned and optionally gzipped by a background worker after every
/// rotation.
///
/// # Example
///
/// ```no_run
/// use gslog_rotate::{RotatingFile, RotatingFileConfig};
///
/// let file = RotatingFile::new(
///     RotatingFileConfig::new("/var/log/app/app.log")
///         .with_max_size_mb(10)
///         .with_max_backups(5)
///         .with_compress(true),
/// );
/// file.write(b"hello\n")?;
/// file.close()?;
/// # Ok::<(), gslog_rotate::RotateError>(())
/// ```
#[derive(Debug)]
pub struct RotatingFile {
    config: RotatingFileConfig,
    path: PathBuf,
    max_size: u64,
    policy: RetentionPolicy,
    inner: Mutex<Inner>,
    passes: Arc<AtomicU64>,
}

#[derive(Debug)]
struct Inner {
    file: Option<File>,
    size: u64,
    worker: WorkerState,
}

impl Inner {
    fn is_closed(&self) -> bool {
        matches!(self.worker, WorkerState::Stopped)
    }
}

/// Lifecycle of the background worker
#[derive(Debug)]
enum WorkerState {
    /// Not started yet; started by the first open
    Idle,
    Running(RetentionWorker),
    /// The file was closed; never restarted
    Stopped,
}

/// Diagnostics collected under the lock, emitted after it is released
#[derive(Debug, Default)]
struct Notes {
    rotated_to: Option<PathBuf>,
    append_failed: Option<io::Error>,
    worker_failed: Option<RotateError>,
}

impl Notes {
    fn emit(self, path: &Path) {
        if let Some(error) = self.append_failed {
            warn!(path = %path.display(), error = %error, "Cannot append to existing log file, starting a new one");
        }
        if let Some(backup) = self.rotated_to {
            debug!(path = %path.display(), backup = %backup.display(), "Rotated log file");
        }
        if let Some(error) = self.worker_failed {
            warn!(path = %path.display(), error = %error, "Retention worker not running");
        }
    }
}

impl RotatingFile {
    /// Create a rotating file; nothing is opened until the first write
    pub fn new(config: RotatingFileConfig) -> Self {
        let path = config.resolved_path();
        let max_size = config.max_size_bytes();
        let policy = RetentionPolicy::new(config.max_backups, config.max_age_days, config.compress);

        Self {
            config,
            path,
            max_size,
            policy,
            inner: Mutex::new(Inner {
                file: None,
                size: 0,
                worker: WorkerState::Idle,
            }),
            passes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configuration this file was created with
    pub fn config(&self) -> &RotatingFileConfig {
        &self.config
    }

    /// Maximum size of the active file in bytes
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Bytes written to the active file since it was opened or created
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Number of retention passes the background worker has completed
    pub fn retention_passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    /// Append `buf` to the active file, rotating first if it would not fit
    ///
    /// A write longer than the maximum file size is rejected with
    /// [`RotateError::OversizedWrite`] and changes nothing.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let len = buf.len() as u64;
        if len > self.max_size {
            return Err(RotateError::OversizedWrite {
                len,
                max: self.max_size,
            });
        }

        let mut notes = Notes::default();
        let result = {
            let mut inner = self.inner.lock();
            self.write_locked(&mut inner, buf, &mut notes)
        };
        notes.emit(&self.path);
        result
    }

    /// Rotate now, regardless of the current size
    pub fn rotate(&self) -> Result<()> {
        let mut notes = Notes::default();
        let result = {
            let mut inner = self.inner.lock();
            if inner.is_closed() {
                Err(RotateError::Closed)
            } else {
                self.rotate_locked(&mut inner, &mut notes)
            }
        };
        notes.emit(&self.path);
        result
    }

    /// Flush the active file to stable storage
    pub fn sync(&self) -> Result<()> {
        let inner = self.inner.lock();
        if let Some(file) = inner.file.as_ref() {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Run one retention pass on the calling thread
    ///
    /// Applies the same policy as the background worker. Files that could
    /// not be removed or compressed come back as
    /// [`RotateError::Retention`]; the rest of the pass still happens.
    pub fn run_retention(&self) -> Result<RetentionReport> {
        Ok(retention::run(&self.path, &self.policy, Utc::now())?)
    }

    /// Close the active file and stop the background worker
    ///
    /// Closing twice is harmless. Writes after closing fail with
    /// [`RotateError::Closed`].
    pub fn close(&self) -> Result<()> {
        let (file, worker) = {
            let mut inner = self.inner.lock();
            let file = inner.file.take();
            let worker = std::mem::replace(&mut inner.worker, WorkerState::Stopped);
            (file, worker)
        };

        let synced = match file {
            Some(file) => file.sync_all(),
            None => Ok(()),
        };

        // joined outside the lock: the worker may be logging into this file
        if let WorkerState::Running(worker) = worker {
            worker.shutdown();
        }

        synced.map_err(RotateError::from)
    }

    fn write_locked(&self, inner: &mut Inner, buf: &[u8], notes: &mut Notes) -> Result<usize> {
        if inner.is_closed() {
            return Err(RotateError::Closed);
        }

        let len = buf.len() as u64;
        if inner.file.is_none() {
            self.open_existing_or_new(inner, len, notes)?;
        }
        if inner.size + len > self.max_size {
            self.rotate_locked(inner, notes)?;
        }

        let Some(file) = inner.file.as_mut() else {
            return Err(io::Error::other("log file is not open").into());
        };
        let (written, result) = write_counted(file, buf);
        inner.size += written as u64;
        result?;
        Ok(written)
    }

    /// Open the file left by a previous run, or create it
    fn open_existing_or_new(&self, inner: &mut Inner, pending: u64, notes: &mut Notes) -> Result<()> {
        self.ensure_worker(inner, notes);
        self.request_retention(inner);

        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.open_new(inner, notes),
            Err(e) => return Err(e.into()),
        };

        if metadata.len() + pending > self.max_size {
            return self.rotate_locked(inner, notes);
        }

        match OpenOptions::new().append(true).open(&self.path) {
            Ok(file) => {
                inner.file = Some(file);
                inner.size = metadata.len();
                Ok(())
            }
            Err(e) => {
                notes.append_failed = Some(e);
                self.open_new(inner, notes)
            }
        }
    }

    /// Close the active file, move it to a backup and start a fresh one
    fn rotate_locked(&self, inner: &mut Inner, notes: &mut Notes) -> Result<()> {
        drop(inner.file.take());
        self.open_new(inner, notes)?;
        self.ensure_worker(inner, notes);
        self.request_retention(inner);
        Ok(())
    }

    /// Create a fresh active file, renaming any existing one to a backup
    fn open_new(&self, inner: &mut Inner, notes: &mut Notes) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            create_dir_all(dir)?;
        }

        let mut mode = DEFAULT_FILE_MODE;
        match fs::metadata(&self.path) {
            Ok(metadata) => {
                let existing = backup::file_mode(&metadata);
                if existing != 0 {
                    mode = existing;
                }
                let backup = backup::unused_backup_name(&self.path, Utc::now());
                fs::rename(&self.path, &backup)?;
                notes.rotated_to = Some(backup);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = create_with_mode(&self.path, mode)?;
        inner.file = Some(file);
        inner.size = 0;
        Ok(())
    }

    fn ensure_worker(&self, inner: &mut Inner, notes: &mut Notes) {
        if !matches!(inner.worker, WorkerState::Idle) {
            return;
        }
        let job = RetentionJob {
            active: self.path.clone(),
            policy: self.policy,
        };
        match RetentionWorker::start(job, Arc::clone(&self.passes)) {
            Ok(worker) => inner.worker = WorkerState::Running(worker),
            Err(e) => notes.worker_failed = Some(e),
        }
    }

    fn request_retention(&self, inner: &Inner) {
        if let WorkerState::Running(worker) = &inner.worker {
            worker.notify();
        }
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Write all of `buf`, reporting how much landed even when it fails midway
fn write_counted(file: &mut File, buf: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while written < buf.len() {
        match file.write(&buf[written..]) {
            Ok(0) => return (written, Err(io::ErrorKind::WriteZero.into())),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (written, Err(e)),
        }
    }
    (written, Ok(()))
}

#[cfg(unix)]
fn create_dir_all(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(DIR_MODE).create(dir)
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> io::Result<()> {
    let _ = DIR_MODE;
    fs::create_dir_all(dir)
}

fn create_with_mode(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(mode);
        let file = options.open(path)?;
        // the process umask may have masked bits off
        file.set_permissions(fs::Permissions::from_mode(mode))?;
        Ok(file)
    }

    #[cfg(not(unix))]
    {
        let _ = mode;
        options.open(path)
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingFile::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingFile::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = &'a RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}
