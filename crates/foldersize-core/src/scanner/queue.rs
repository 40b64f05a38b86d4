/// Work queue of pending directory listings.
///
/// An unbounded crossbeam channel whose single `Sender` sits behind a mutex.
/// Closing the queue drops that sender: pops then drain whatever is still
/// buffered and return `None` once it is empty.
///
/// The queue closes itself when the number of pending tasks (queued plus
/// in progress) drops to zero. A worker pushes a directory's children
/// before calling [`WorkQueue::task_done`] for the directory itself, so the
/// count can only reach zero when no work is left anywhere.
use crate::model::NodeIndex;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A directory awaiting listing.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub path: PathBuf,
    /// The directory's node in the size tree.
    pub node: NodeIndex,
    /// Depth from the scan root (0 = root).
    pub depth: u32,
}

impl ScanTask {
    pub fn new(path: PathBuf, node: NodeIndex, depth: u32) -> Self {
        Self { path, node, depth }
    }
}

#[derive(Debug, Default)]
pub struct QueueStats {
    pub enqueued: AtomicU64,
    pub dequeued: AtomicU64,
    /// Pushes refused because the queue was closed.
    pub rejected: AtomicU64,
}

#[derive(Debug)]
pub struct WorkQueue {
    sender: Mutex<Option<Sender<ScanTask>>>,
    receiver: Receiver<ScanTask>,
    pending: AtomicUsize,
    stats: QueueStats,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            pending: AtomicUsize::new(0),
            stats: QueueStats::default(),
        }
    }

    /// Enqueue a task. Returns `false` if the queue is closed.
    pub fn push(&self, task: ScanTask) -> bool {
        let guard = self.sender.lock();
        let Some(tx) = guard.as_ref() else {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(task).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Block until a task is available. Returns `None` once the queue is
    /// closed and drained.
    pub fn pop(&self) -> Option<ScanTask> {
        let task = self.receiver.recv().ok()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(task)
    }

    /// Mark a popped task as finished. Closes the queue when nothing is
    /// queued or in progress.
    pub fn task_done(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.close();
        }
    }

    /// Stop accepting pushes. Returns `true` if this call closed the queue.
    pub fn close(&self) -> bool {
        self.sender.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Tasks queued or in progress.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}
