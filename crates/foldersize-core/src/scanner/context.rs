/// Run-wide state shared by the coordinator, the workers and the reporter.
use super::interrupt::InterruptController;
use super::options::ScanOptions;
use super::progress::{ProgressCounters, ScanProgress};
use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use std::time::{Duration, Instant};

/// Explicitly passed to every worker at construction; there is no global state.
#[derive(Debug)]
pub struct RunContext {
    pub options: ScanOptions,
    pub counters: ProgressCounters,
    pub interrupt: InterruptController,
    pub progress_tx: Sender<ScanProgress>,
    /// Monotonic start, used for elapsed time.
    pub started: Instant,
    /// Wall-clock start, for reports.
    pub started_at: DateTime<Local>,
}

impl RunContext {
    pub fn new(options: ScanOptions, progress_tx: Sender<ScanProgress>) -> Self {
        Self {
            options,
            counters: ProgressCounters::default(),
            interrupt: InterruptController::new(),
            progress_tx,
            started: Instant::now(),
            started_at: Local::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
