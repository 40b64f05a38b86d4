/// Error taxonomy for the scan engine.
///
/// Per-entry and per-directory failures (`PermissionDenied`, `Vanished`,
/// `Io`) are recovered inside the scanner workers: they are logged, counted,
/// and forwarded to the progress channel, but never abort a run. Everything
/// else is fatal and is returned from [`crate::scanner::run_scan`].
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// The entry or directory could not be read.
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry was removed between listing and stat.
    #[error("entry vanished during scan: {}", path.display())]
    Vanished { path: PathBuf },

    /// Any other I/O failure while listing or stat-ing.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory was committed twice. Indicates a work-queue de-duplication bug.
    #[error("directory scanned twice: {}", path.display())]
    DuplicateScan { path: PathBuf },

    /// The scan root does not exist or is not a directory.
    #[error("invalid scan root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("invalid scan options: {0}")]
    InvalidOptions(String),

    /// A scanner thread could not be started.
    #[error("failed to spawn scanner thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("scanner worker {id} panicked")]
    WorkerPanicked { id: usize },

    #[error("scan coordinator thread panicked")]
    CoordinatorPanicked,
}

impl ScanError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source: err },
            io::ErrorKind::NotFound => Self::Vanished { path },
            _ => Self::Io { path, source: err },
        }
    }

    /// `true` for errors that must end the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::PermissionDenied { .. } | Self::Vanished { .. } | Self::Io { .. }
        )
    }

    /// Path the error refers to, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PermissionDenied { path, .. }
            | Self::Vanished { path }
            | Self::Io { path, .. }
            | Self::DuplicateScan { path }
            | Self::InvalidRoot { path, .. } => Some(path),
            Self::InvalidOptions(_)
            | Self::Spawn(_)
            | Self::WorkerPanicked { .. }
            | Self::CoordinatorPanicked => None,
        }
    }
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified() {
        let p = Path::new("/data/x");
        let denied = ScanError::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, ScanError::PermissionDenied { .. }));

        let gone = ScanError::from_io(p, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(gone, ScanError::Vanished { .. }));

        let other = ScanError::from_io(p, io::Error::other("device fault"));
        assert!(matches!(other, ScanError::Io { .. }));
        assert_eq!(other.path(), Some(p));
    }

    #[test]
    fn only_entry_errors_are_recoverable() {
        let p = PathBuf::from("/data");
        assert!(!ScanError::Vanished { path: p.clone() }.is_fatal());
        assert!(ScanError::DuplicateScan { path: p }.is_fatal());
        assert!(ScanError::WorkerPanicked { id: 3 }.is_fatal());
    }
}
