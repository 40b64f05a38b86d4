/// foldersize core — the concurrent folder size engine.
///
/// This crate contains all scanning logic with zero console or CLI
/// dependencies. Frontends consume a finished (or partial) [`ScanResult`]
/// plus the progress channel of a [`ScanHandle`].
///
/// # Modules
///
/// - [`model`] — Arena-allocated size tree, aggregation, and size formatting.
/// - [`scanner`] — Work queue, worker pool, progress counters, and interruption.
/// - [`error`] — Error taxonomy shared by the engine and its frontends.
pub mod error;
pub mod model;
pub mod scanner;

pub use error::ScanError;
pub use scanner::{
    run_scan, start_scan, Interrupter, ScanHandle, ScanOptions, ScanResult, ScanTotals,
};
