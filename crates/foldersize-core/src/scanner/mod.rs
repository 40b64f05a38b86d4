/// Scanner module — orchestrates the concurrent folder size scan.
///
/// A fixed pool of worker threads drains a shared [`queue::WorkQueue`]
/// seeded with the scan root. Every worker writes into a **shared
/// `SharedTree`** (`Arc<RwLock<SizeTree>>`), holding the write lock only
/// while committing one directory. When the workers have exited (queue
/// drained, or interrupted) the coordinator aggregates the tree bottom-up
/// and builds a [`ScanResult`].
pub mod context;
pub mod interrupt;
pub mod options;
pub mod progress;
pub mod queue;
pub mod worker;

use crate::error::{Result, ScanError};
use crate::model::size_tree::serialize_path_lossy;
use crate::model::{SizeEntry, SizeTree};
use chrono::{DateTime, Local};
use context::RunContext;
use crossbeam_channel::{Receiver, Sender};
use interrupt::RunPhase;
use parking_lot::RwLock;
use progress::{notify, ScanProgress};
use queue::{ScanTask, WorkQueue};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};
use worker::Worker;

pub use options::ScanOptions;

/// A shared, concurrently-readable size tree.
pub type SharedTree = Arc<RwLock<SizeTree>>;

/// Maximum number of progress messages that may queue up in the channel.
///
/// Producers use `try_send`, so a frontend that falls behind loses
/// intermediate updates instead of stalling the scan.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Summary counters of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanTotals {
    /// Regular files counted.
    pub files: u64,
    /// Directories whose listing completed.
    pub directories: u64,
    /// Sum of all counted file sizes.
    pub bytes: u64,
    /// Non-fatal errors encountered.
    pub errors: u64,
    /// Directories discovered but never listed because the run stopped.
    pub unscanned_dirs: u64,
}

/// The (possibly partial) outcome of a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    #[serde(serialize_with = "serialize_path_lossy")]
    pub root: PathBuf,
    /// `(path, cumulative size)` rows, sorted by path.
    pub entries: Vec<SizeEntry>,
    pub totals: ScanTotals,
    pub started_at: DateTime<Local>,
    pub elapsed_seconds: f64,
    /// `true` if the scan was stopped before the queue drained.
    pub interrupted: bool,
}

impl ScanResult {
    /// Entries (files + directories) per second.
    pub fn scan_rate(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            (self.totals.files + self.totals.directories) as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }

    /// Cumulative size of the scan root, if its listing completed.
    pub fn root_size(&self) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.path == self.root)
            .map(|e| e.size)
    }
}

/// Cloneable interruption entry point, safe to call from a signal handler.
#[derive(Clone)]
pub struct Interrupter {
    ctx: Arc<RunContext>,
    queue: Arc<WorkQueue>,
}

impl Interrupter {
    /// Ask the scan to stop. Workers finish the directory they are listing;
    /// nothing new is listed. Returns `false` if the scan was already
    /// stopping or finished.
    pub fn interrupt(&self) -> bool {
        // The queue closed itself: every directory was listed, the workers
        // are only winding down.
        if self.queue.is_closed() && self.ctx.interrupt.phase() == RunPhase::Running {
            debug!("Interrupt ignored, scan already complete");
            return false;
        }
        if !self.ctx.interrupt.request_stop() {
            return false;
        }
        info!(
            pending = self.queue.pending(),
            "Interrupt requested, finishing in-flight directories"
        );
        self.queue.close();
        notify(&self.ctx.progress_tx, ScanProgress::Interrupted);
        true
    }

    pub fn is_interrupted(&self) -> bool {
        self.ctx.interrupt.was_interrupted()
    }
}

/// A prepared scan: root node created and seeded, workers not yet started.
pub struct Scan {
    root: PathBuf,
    tree: SharedTree,
    queue: Arc<WorkQueue>,
    ctx: Arc<RunContext>,
}

impl Scan {
    /// Validate the root and options, create the root node, and seed the queue.
    pub fn new(root: &Path, options: ScanOptions, progress_tx: Sender<ScanProgress>) -> Result<Self> {
        options.validate()?;
        check_root(root)?;

        let tree: SharedTree = Arc::new(RwLock::new(SizeTree::with_capacity(4_096)));
        let root_node = tree.write().add_root(root);

        let queue = Arc::new(WorkQueue::new());
        queue.push(ScanTask::new(root.to_path_buf(), root_node, 0));

        Ok(Self {
            root: root.to_path_buf(),
            tree,
            queue,
            ctx: Arc::new(RunContext::new(options, progress_tx)),
        })
    }

    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            ctx: Arc::clone(&self.ctx),
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn tree(&self) -> SharedTree {
        Arc::clone(&self.tree)
    }

    /// Run the worker pool to completion (or interruption), then aggregate.
    pub fn run(self) -> Result<ScanResult> {
        let opts = &self.ctx.options;
        info!(
            root = %self.root.display(),
            workers = opts.worker_count,
            include_hidden = opts.include_hidden,
            "Starting scan"
        );

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);
        let reporter = progress::spawn_reporter(
            Arc::clone(&self.ctx),
            opts.progress_interval,
            done_rx,
        )
        .map_err(ScanError::Spawn)?;

        let mut workers = Vec::with_capacity(opts.worker_count);
        let mut failure: Option<ScanError> = None;
        for id in 0..opts.worker_count {
            match Worker::spawn(
                id,
                Arc::clone(&self.tree),
                Arc::clone(&self.queue),
                Arc::clone(&self.ctx),
            ) {
                Ok(w) => workers.push(w),
                Err(err) => {
                    // Wind down whatever already started.
                    self.ctx.interrupt.request_stop();
                    self.queue.close();
                    failure = Some(err);
                    break;
                }
            }
        }

        for w in workers {
            if let Err(err) = w.join() {
                failure.get_or_insert(err);
            }
        }
        self.ctx.interrupt.finish();
        drop(done_tx);
        if reporter.join().is_err() {
            warn!("Progress reporter thread panicked");
        }

        if let Some(err) = failure {
            return Err(err);
        }

        let interrupted = self.ctx.interrupt.was_interrupted();
        let stats = self.queue.stats();
        debug!(
            elapsed = ?self.ctx.elapsed(),
            interrupted,
            enqueued = stats.enqueued.load(Ordering::Relaxed),
            dequeued = stats.dequeued.load(Ordering::Relaxed),
            rejected = stats.rejected.load(Ordering::Relaxed),
            "Workers finished, aggregating sizes"
        );

        let entries = {
            let mut tree = self.tree.write();
            tree.aggregate();
            tree.entries(opts.top_level_only)
        };

        let snap = self.ctx.counters.snapshot();
        let duration = self.ctx.elapsed();
        let result = ScanResult {
            root: self.root,
            entries,
            totals: ScanTotals {
                files: snap.files,
                directories: snap.dirs,
                bytes: snap.bytes,
                errors: snap.errors,
                unscanned_dirs: snap.unscanned,
            },
            started_at: self.ctx.started_at,
            elapsed_seconds: duration.as_secs_f64(),
            interrupted,
        };

        info!(
            files = snap.files,
            dirs = snap.dirs,
            bytes = snap.bytes,
            errors = snap.errors,
            unscanned = snap.unscanned,
            interrupted,
            duration_secs = duration.as_secs_f64(),
            "Scan finished"
        );

        notify(
            &self.ctx.progress_tx,
            ScanProgress::Complete {
                duration,
                error_count: snap.errors,
            },
        );
        Ok(result)
    }
}

fn check_root(root: &Path) -> Result<()> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".into(),
        }),
        Err(err) => Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

/// Handle to a scan running on a background thread. Allows interruption
/// and receiving progress updates.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan.
    pub progress_rx: Receiver<ScanProgress>,
    /// Shared tree that is populated incrementally during scanning.
    pub tree: SharedTree,
    interrupter: Interrupter,
    thread: Option<thread::JoinHandle<Result<ScanResult>>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as in-flight directories are done.
    pub fn interrupt(&self) -> bool {
        self.interrupter.interrupt()
    }

    /// A cloneable interrupt entry point (e.g. for a Ctrl-C handler).
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupter.is_interrupted()
    }

    /// `true` once the coordinator thread has returned.
    ///
    /// The progress channel is not guaranteed to disconnect at the end of a
    /// scan (an outstanding [`Interrupter`] keeps it open), so frontends poll
    /// this instead.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Block until the scan finishes and return its result.
    pub fn wait(mut self) -> Result<ScanResult> {
        match self.thread.take() {
            Some(handle) => handle
                .join()
                .unwrap_or(Err(ScanError::CoordinatorPanicked)),
            None => Err(ScanError::CoordinatorPanicked),
        }
    }
}

/// Start a new scan on a background thread.
///
/// Returns a `ScanHandle` for receiving progress, accessing the shared
/// tree, and requesting interruption.
pub fn start_scan(root: PathBuf, options: ScanOptions) -> Result<ScanHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);

    let scan = Scan::new(&root, options, progress_tx)?;
    let tree = scan.tree();
    let interrupter = scan.interrupter();

    let thread = thread::Builder::new()
        .name("foldersize-coordinator".into())
        .spawn(move || scan.run())
        .map_err(ScanError::Spawn)?;

    Ok(ScanHandle {
        progress_rx,
        tree,
        interrupter,
        thread: Some(thread),
    })
}

/// Run a scan to completion on the calling thread.
///
/// Progress messages are discarded; use [`start_scan`] to observe them.
pub fn run_scan(root: &Path, options: ScanOptions) -> Result<ScanResult> {
    let (progress_tx, _) = crossbeam_channel::bounded::<ScanProgress>(1);
    Scan::new(root, options, progress_tx)?.run()
}
