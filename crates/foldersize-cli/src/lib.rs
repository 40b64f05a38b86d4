/// foldersize-cli: command-line frontend for the scan engine.
///
/// # Modules
///
/// - [`args`] — clap argument definitions and their mapping to `ScanOptions`.
/// - [`console`] — header, progress line, and summary output.
/// - [`report`] — CSV and JSON report writers.
pub mod args;
pub mod console;
pub mod report;

use anyhow::{Context, Result};
use args::CliArgs;
use crossbeam_channel::RecvTimeoutError;
use foldersize_core::scanner::progress::ScanProgress;
use foldersize_core::{start_scan, ScanHandle, ScanResult};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound on how long the progress pump sleeps between liveness checks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Scan, print progress and summary, and write the report.
///
/// Ctrl-C requests a graceful stop; partial results are still reported.
pub fn run(args: &CliArgs) -> Result<ScanResult> {
    scan_and_report(args, |handle| {
        let interrupter = handle.interrupter();
        ctrlc::set_handler(move || {
            if interrupter.interrupt() {
                eprintln!("\nStopping scan gracefully (this may take a moment)...");
            }
        })
        .context("Failed to set signal handler")
    })
}

/// Same as [`run`], with the interrupt wiring supplied by the caller.
///
/// `on_start` sees the running scan before progress is pumped; it can take
/// an [`Interrupter`](foldersize_core::Interrupter) from the handle.
pub fn scan_and_report<F>(args: &CliArgs, on_start: F) -> Result<ScanResult>
where
    F: FnOnce(&ScanHandle) -> Result<()>,
{
    let options = args.scan_options();
    let output = args.output_path();
    let poll = POLL_INTERVAL.min(options.progress_interval);
    let mut stdout = io::stdout();

    console::print_header(&mut stdout, &args.mount_point)?;

    let handle = start_scan(args.mount_point.clone(), options)
        .with_context(|| format!("Failed to start scan of {}", args.mount_point.display()))?;
    on_start(&handle)?;

    pump_progress(&handle, args.quiet, poll)?;

    let result = handle
        .wait()
        .with_context(|| format!("Scan of {} failed", args.mount_point.display()))?;

    if result.interrupted {
        writeln!(stdout, "\nScan interrupted. Writing partial results...")?;
    }
    console::print_summary(&mut stdout, &result)?;

    report::write_report(&result, &output, args.format)?;
    info!(
        output = %output.display(),
        entries = result.entries.len(),
        "Report written"
    );

    if result.interrupted {
        writeln!(stdout, "\nPartial results written to: {}", output.display())?;
    } else {
        writeln!(stdout, "\nFolder sizes report written to: {}", output.display())?;
    }
    writeln!(stdout)?;

    Ok(result)
}

/// Print progress messages until the coordinator thread returns.
fn pump_progress(handle: &ScanHandle, quiet: bool, poll: Duration) -> io::Result<()> {
    let mut stdout = io::stdout();
    let mut printed = false;

    let mut handle_message = |msg: ScanProgress, stdout: &mut io::Stdout| -> io::Result<()> {
        match msg {
            ScanProgress::Update { files_found, .. } => {
                if !quiet {
                    console::print_progress(stdout, files_found)?;
                    printed = true;
                }
            }
            ScanProgress::Error { path, message } => {
                if printed {
                    writeln!(stdout)?;
                    printed = false;
                }
                eprintln!("Error accessing {path}: {message}");
            }
            ScanProgress::Interrupted => debug!("Interrupt acknowledged by scanner"),
            ScanProgress::Complete {
                duration,
                error_count,
            } => debug!(?duration, error_count, "Scanner reported completion"),
        }
        Ok(())
    };

    while !handle.is_finished() {
        match handle.progress_rx.recv_timeout(poll) {
            Ok(msg) => handle_message(msg, &mut stdout)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    for msg in handle.progress_rx.try_iter() {
        handle_message(msg, &mut stdout)?;
    }
    if printed {
        writeln!(stdout)?;
    }
    Ok(())
}
