/// Scan progress reporting — atomic counters bumped by the workers, and
/// lightweight messages sent to the frontend via a crossbeam channel.
///
/// Workers never wait on the frontend: every message is sent with
/// `try_send` and dropped if the channel is full or nobody is listening.
use crossbeam_channel::{select, tick, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::trace;

use super::context::RunContext;

/// Progress updates sent from the scan to the frontend.
///
/// The tree itself lives in the shared `SharedTree`; these messages
/// carry only counters and status flags.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// Periodic update with running totals.
    Update {
        files_found: u64,
        dirs_found: u64,
        total_size: u64,
        elapsed: Duration,
    },
    /// A non-fatal error (e.g. permission denied on one directory).
    Error { path: String, message: String },
    /// The scan was interrupted; partial results are being aggregated.
    Interrupted,
    /// Scanning and aggregation completed.
    Complete { duration: Duration, error_count: u64 },
}

/// Run-wide counters. Safe to bump from any worker without locking.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    files: AtomicU64,
    dirs: AtomicU64,
    bytes: AtomicU64,
    errors: AtomicU64,
    unscanned: AtomicU64,
}

/// A point-in-time copy of [`ProgressCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
    pub errors: u64,
    pub unscanned: u64,
}

impl ProgressCounters {
    #[inline]
    pub fn increment_files(&self, n: u64) {
        self.files.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_dirs(&self, n: u64) {
        self.dirs.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_bytes(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// A discovered directory that will never be listed (run stopping).
    #[inline]
    pub fn record_unscanned(&self, n: u64) {
        self.unscanned.fetch_add(n, Ordering::Relaxed);
    }

    pub fn files(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            files: self.files.load(Ordering::Relaxed),
            dirs: self.dirs.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            unscanned: self.unscanned.load(Ordering::Relaxed),
        }
    }
}

/// Per-worker batch of file counts, flushed into the shared counters
/// every `FLUSH_EVERY` files and at the end of each listing.
#[derive(Debug, Default)]
pub(crate) struct BatchCounter {
    files: u64,
    bytes: u64,
}

impl BatchCounter {
    const FLUSH_EVERY: u64 = 1_000;

    pub(crate) fn add_file(&mut self, size: u64, counters: &ProgressCounters) {
        self.files += 1;
        self.bytes += size;
        if self.files >= Self::FLUSH_EVERY {
            self.flush(counters);
        }
    }

    pub(crate) fn flush(&mut self, counters: &ProgressCounters) {
        if self.files > 0 {
            counters.increment_files(self.files);
            counters.add_bytes(self.bytes);
        }
        *self = Self::default();
    }
}

/// Send a message without ever blocking the caller.
#[inline]
pub(crate) fn notify(tx: &Sender<ScanProgress>, msg: ScanProgress) {
    let _ = tx.try_send(msg);
}

/// Spawn the reporting loop. It samples the counters every
/// `interval` and emits an `Update` whenever they moved, until `done`
/// fires or is disconnected.
pub(crate) fn spawn_reporter(
    ctx: Arc<RunContext>,
    interval: Duration,
    done: Receiver<()>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("foldersize-progress".into())
        .spawn(move || {
            let ticker = tick(interval);
            let mut last = CounterSnapshot::default();
            loop {
                select! {
                    recv(ticker) -> _ => {
                        let snap = ctx.counters.snapshot();
                        if snap.files != last.files || snap.dirs != last.dirs {
                            last = snap;
                            trace!(files = snap.files, dirs = snap.dirs, "progress tick");
                            notify(
                                &ctx.progress_tx,
                                ScanProgress::Update {
                                    files_found: snap.files,
                                    dirs_found: snap.dirs,
                                    total_size: snap.bytes,
                                    elapsed: ctx.elapsed(),
                                },
                            );
                        }
                    }
                    recv(done) -> _ => break,
                }
            }
        })
}
