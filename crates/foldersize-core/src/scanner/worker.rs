/// Scanner worker threads.
///
/// Each worker:
/// - pops a directory task from the shared [`WorkQueue`]
/// - lists the directory with `std::fs::read_dir`, summing regular-file sizes
/// - commits the immediate size and creates child nodes under a single
///   write lock on the shared tree
/// - pushes newly created children back onto the queue
///
/// Listing and stat failures are logged, counted and forwarded to the
/// progress channel; the directory keeps whatever was accumulated before
/// the failure. Only an invariant violation ends a worker early.
use super::context::RunContext;
use super::progress::{notify, BatchCounter, ScanProgress};
use super::queue::{ScanTask, WorkQueue};
use super::SharedTree;
use crate::error::{Result, ScanError};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

/// What a directory entry is, decided once from its (non-followed) file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RegularFile,
    Directory,
    /// Symlinks, sockets, devices, FIFOs: zero-size and never traversed.
    Other,
}

impl EntryKind {
    pub fn classify(file_type: fs::FileType) -> Self {
        if file_type.is_file() {
            Self::RegularFile
        } else if file_type.is_dir() {
            Self::Directory
        } else {
            Self::Other
        }
    }
}

/// `true` if the entry name starts with `.`.
#[inline]
pub fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

/// Result of listing one directory.
#[derive(Debug, Default)]
struct Listing {
    immediate_size: u64,
    subdirs: Vec<PathBuf>,
    /// Listing stopped early on an error.
    failed: bool,
}

pub(crate) struct Worker {
    id: usize,
    handle: Option<JoinHandle<Result<()>>>,
}

impl Worker {
    pub(crate) fn spawn(
        id: usize,
        tree: SharedTree,
        queue: Arc<WorkQueue>,
        ctx: Arc<RunContext>,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("foldersize-scan-{id}"))
            .spawn(move || worker_loop(id, &tree, &queue, &ctx))
            .map_err(ScanError::Spawn)?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Wait for the worker to exit.
    pub(crate) fn join(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .unwrap_or(Err(ScanError::WorkerPanicked { id: self.id })),
            None => Ok(()),
        }
    }
}

fn worker_loop(id: usize, tree: &SharedTree, queue: &WorkQueue, ctx: &RunContext) -> Result<()> {
    debug!(worker = id, "Worker starting");
    let mut listed: u64 = 0;

    while let Some(task) = queue.pop() {
        if ctx.interrupt.is_stopping() {
            // Discovered before the stop, never listed.
            trace!(worker = id, path = %task.path.display(), "Dropping queued directory");
            ctx.counters.record_unscanned(1);
            queue.task_done();
            continue;
        }

        let result = scan_directory(id, &task, tree, queue, ctx);
        queue.task_done();
        listed += 1;

        if let Err(err) = result {
            error!(worker = id, error = %err, "Scan invariant violated, stopping run");
            ctx.interrupt.request_stop();
            queue.close();
            return Err(err);
        }
    }

    debug!(worker = id, listed, "Worker exiting");
    Ok(())
}

/// List one directory, commit it to the tree, and enqueue its children.
fn scan_directory(
    id: usize,
    task: &ScanTask,
    tree: &SharedTree,
    queue: &WorkQueue,
    ctx: &RunContext,
) -> Result<()> {
    let listing = list_directory(&task.path, ctx);

    let children: Vec<ScanTask> = {
        let mut tree = tree.write();
        tree.commit_immediate(task.node, listing.immediate_size)?;
        if listing.failed {
            tree.mark_error(task.node);
        }
        listing
            .subdirs
            .into_iter()
            .filter_map(|path| {
                let (node, created) = tree.get_or_create_entry(&path);
                created.then(|| ScanTask::new(path, node, task.depth + 1))
            })
            .collect()
    };
    ctx.counters.increment_dirs(1);

    trace!(
        worker = id,
        path = %task.path.display(),
        size = listing.immediate_size,
        subdirs = children.len(),
        "Directory listed"
    );

    let mut rejected: u64 = 0;
    for child in children {
        if !queue.push(child) {
            rejected += 1;
        }
    }
    if rejected > 0 {
        debug!(worker = id, path = %task.path.display(), rejected, "Queue closed, children left unscanned");
        ctx.counters.record_unscanned(rejected);
    }
    Ok(())
}

fn list_directory(dir: &Path, ctx: &RunContext) -> Listing {
    let mut listing = Listing::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            report_error(ctx, ScanError::from_io(dir, err));
            listing.failed = true;
            return listing;
        }
    };

    let include_hidden = ctx.options.include_hidden;
    let mut batch = BatchCounter::default();

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                // The directory stream itself broke; keep what we have.
                report_error(ctx, ScanError::from_io(dir, err));
                listing.failed = true;
                break;
            }
        };

        if !include_hidden && is_hidden(&entry.file_name()) {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(err) => {
                report_error(ctx, ScanError::from_io(&entry.path(), err));
                continue;
            }
        };

        match EntryKind::classify(file_type) {
            EntryKind::RegularFile => match entry.metadata() {
                Ok(meta) => {
                    listing.immediate_size += meta.len();
                    batch.add_file(meta.len(), &ctx.counters);
                }
                Err(err) => report_error(ctx, ScanError::from_io(&entry.path(), err)),
            },
            EntryKind::Directory => listing.subdirs.push(entry.path()),
            EntryKind::Other => {
                trace!(path = %entry.path().display(), "Skipping special entry");
            }
        }
    }

    batch.flush(&ctx.counters);
    listing
}

/// Record a recoverable error: count it, log it, forward it to the frontend.
fn report_error(ctx: &RunContext, err: ScanError) {
    ctx.counters.record_error();
    let path = err
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    warn!(path = %path, error = %err, "Skipping unreadable entry");
    notify(
        &ctx.progress_tx,
        ScanProgress::Error {
            path,
            message: err.to_string(),
        },
    );
}
