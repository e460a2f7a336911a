//! Background retention worker
//!
//! Each [`RotatingFile`](crate::RotatingFile) owns at most one worker: a
//! dedicated thread driving a single-threaded tokio runtime. The worker
//! waits on a capacity-1 signal channel and a cancellation channel. Sending
//! a signal never blocks; if one is already pending the new request is
//! dropped, since the pending pass will see the same files.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{Result, RotateError};
use crate::retention::{self, RetentionPolicy};

/// What a retention pass operates on
#[derive(Debug, Clone)]
pub(crate) struct RetentionJob {
    pub(crate) active: PathBuf,
    pub(crate) policy: RetentionPolicy,
}

impl RetentionJob {
    fn run(&self) {
        match retention::run(&self.active, &self.policy, Utc::now()) {
            Ok(report) if report.removed.is_empty() && report.compressed.is_empty() => {}
            Ok(report) => {
                info!(
                    path = %self.active.display(),
                    removed = report.removed.len(),
                    compressed = report.compressed.len(),
                    "Pruned log backups"
                );
            }
            Err(errors) => {
                warn!(
                    path = %self.active.display(),
                    failed = errors.len(),
                    error = %errors,
                    "Retention pass failed for some backups"
                );
            }
        }
    }
}

/// Handle to a running retention worker
#[derive(Debug)]
pub(crate) struct RetentionWorker {
    signal_tx: mpsc::Sender<()>,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RetentionWorker {
    /// Spawn the worker thread
    ///
    /// `passes` is incremented after every completed retention pass.
    pub(crate) fn start(job: RetentionJob, passes: Arc<AtomicU64>) -> Result<Self> {
        let (signal_tx, mut signal_rx) = mpsc::channel::<()>(1);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| RotateError::worker(e.to_string()))?;

        let handle = thread::Builder::new()
            .name("gslog-retention".to_string())
            .spawn(move || {
                let path = job.active.clone();
                debug!(path = %path.display(), "Retention worker started");
                runtime.block_on(async move {
                    loop {
                        tokio::select! {
                            biased;
                            // only ever set to true, or dropped
                            _ = cancel_rx.changed() => break,
                            signal = signal_rx.recv() => {
                                if signal.is_none() {
                                    break;
                                }
                                job.run();
                                passes.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                    }
                });
                debug!(path = %path.display(), "Retention worker stopped");
            })
            .map_err(|e| RotateError::worker(e.to_string()))?;

        Ok(Self {
            signal_tx,
            cancel_tx,
            handle,
        })
    }

    /// Request a retention pass without blocking
    ///
    /// Returns `false` if a pass was already pending and this request was
    /// coalesced into it.
    pub(crate) fn notify(&self) -> bool {
        self.signal_tx.try_send(()).is_ok()
    }

    /// Cancel the worker and wait for it to exit
    ///
    /// A pass that is already running is allowed to finish.
    pub(crate) fn shutdown(self) {
        let _ = self.cancel_tx.send(true);
        drop(self.signal_tx);
        if self.handle.join().is_err() {
            warn!("Retention worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, Instant};

    use crate::backup;

    fn wait_for(passes: &AtomicU64, at_least: u64) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while passes.load(Ordering::SeqCst) < at_least {
            assert!(Instant::now() < deadline, "retention pass did not run");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_worker_runs_pass_on_signal() {
        let dir = tempfile::tempdir().unwrap();
        let active = dir.path().join("app.log");
        let now = Utc::now();
        for days in 1..=3 {
            let path = backup::backup_name(&active, now - chrono::TimeDelta::days(days));
            fs::write(path, b"x").unwrap();
        }

        let passes = Arc::new(AtomicU64::new(0));
        let job = RetentionJob {
            active: active.clone(),
            policy: RetentionPolicy::new(1, 0, false),
        };
        let worker = RetentionWorker::start(job, Arc::clone(&passes)).unwrap();

        assert!(worker.notify());
        wait_for(&passes, 1);
        worker.shutdown();

        let (dir_path, prefix, ext) = backup::backup_parts(&active);
        assert_eq!(backup::scan_backups(&dir_path, &prefix, &ext).unwrap().len(), 1);
    }

    #[test]
    fn test_shutdown_without_signal() {
        let dir = tempfile::tempdir().unwrap();
        let passes = Arc::new(AtomicU64::new(0));
        let job = RetentionJob {
            active: dir.path().join("app.log"),
            policy: RetentionPolicy::default(),
        };

        let worker = RetentionWorker::start(job, Arc::clone(&passes)).unwrap();
        worker.shutdown();

        assert_eq!(passes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_signals_coalesce() {
        let dir = tempfile::tempdir().unwrap();
        let passes = Arc::new(AtomicU64::new(0));
        let job = RetentionJob {
            active: dir.path().join("app.log"),
            policy: RetentionPolicy::new(1, 0, false),
        };
        let worker = RetentionWorker::start(job, Arc::clone(&passes)).unwrap();

        let accepted = (0..100).filter(|_| worker.notify()).count() as u64;
        assert!(accepted >= 1);

        wait_for(&passes, 1);
        thread::sleep(Duration::from_millis(50));
        worker.shutdown();

        // every accepted signal produced exactly one pass, never more
        let ran = passes.load(Ordering::SeqCst);
        assert!(ran >= 1);
        assert!(ran <= accepted);
    }
}
