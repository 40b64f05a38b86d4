/// Command-line arguments.
use clap::{ArgAction, Parser, ValueEnum};
use foldersize_core::scanner::options::DEFAULT_WORKERS;
use foldersize_core::ScanOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Output format of the folder size report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// `Folder Path,Size` rows with human-readable sizes.
    Csv,
    /// The full scan result, sizes in bytes.
    Json,
}

/// High-performance directory size scanner
#[derive(Parser, Debug, Clone)]
#[command(
    name = "folder-sizes",
    version,
    about = "High-performance directory size scanner",
    after_help = "EXAMPLES:\n    \
        folder-sizes --mount-point /data\n    \
        folder-sizes --mount-point /data --top-level\n    \
        folder-sizes --mount-point /data --include-hidden --workers 16\n    \
        folder-sizes --mount-point /data --output sizes.json --format json"
)]
pub struct CliArgs {
    /// Root path to scan
    #[arg(short = 'm', long, value_name = "PATH")]
    pub mount_point: PathBuf,

    /// Output report file (default: folder_sizes.csv, or folder_sizes.json with --format json)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Include hidden files and folders (starting with ".")
    #[arg(long)]
    pub include_hidden: bool,

    /// Number of worker threads
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS, value_name = "NUM")]
    pub workers: usize,

    /// Only report sizes for top-level directories
    #[arg(long)]
    pub top_level: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
    pub format: ReportFormat,

    /// How often the progress line is refreshed, in milliseconds
    #[arg(long, default_value_t = 500, value_name = "MS")]
    pub progress_interval_ms: u64,

    /// Suppress the progress line
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl CliArgs {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            include_hidden: self.include_hidden,
            worker_count: self.workers,
            top_level_only: self.top_level,
            progress_interval: Duration::from_millis(self.progress_interval_ms),
        }
    }

    /// Report path: `--output` if given, else `folder_sizes.<format>`.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("folder_sizes.{}", self.format.extension())),
        }
    }

    /// Log level selected by `-v` repetitions.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
