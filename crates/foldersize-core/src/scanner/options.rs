/// Scan configuration.
use crate::error::{Result, ScanError};
use std::time::Duration;

/// Default worker count. 8 suits local disks; network mounts tend to
/// benefit from 16 or more because each listing spends longer blocked.
pub const DEFAULT_WORKERS: usize = 8;

/// Upper bound on the worker pool.
pub const MAX_WORKERS: usize = 512;

/// Default sampling interval of the progress reporter.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Include entries whose name starts with `.` in sizes and traversal.
    pub include_hidden: bool,
    /// Number of scanner worker threads.
    pub worker_count: usize,
    /// Report only the root and its direct children.
    pub top_level_only: bool,
    /// How often the reporter samples the progress counters.
    pub progress_interval: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            worker_count: DEFAULT_WORKERS,
            top_level_only: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ScanOptions {
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ScanError::InvalidOptions(
                "worker count must be at least 1".into(),
            ));
        }
        if self.worker_count > MAX_WORKERS {
            return Err(ScanError::InvalidOptions(format!(
                "worker count {} exceeds the maximum of {MAX_WORKERS}",
                self.worker_count
            )));
        }
        if self.progress_interval.is_zero() {
            return Err(ScanError::InvalidOptions(
                "progress interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
