/// Console output: header, carriage-return progress line, and the final summary.
use foldersize_core::model::size::{format_count, format_size};
use foldersize_core::ScanResult;
use std::io::{self, Write};
use std::path::Path;

pub fn print_header<W: Write>(out: &mut W, root: &Path) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Starting scan of {}", root.display())
}

/// Overwrite the current line with the running file count.
pub fn print_progress<W: Write>(out: &mut W, files: u64) -> io::Result<()> {
    write!(out, "\rProcessed {} files...", format_count(files))?;
    out.flush()
}

pub fn print_summary<W: Write>(out: &mut W, result: &ScanResult) -> io::Result<()> {
    let totals = &result.totals;
    writeln!(out)?;
    writeln!(out, "Scan Summary:")?;
    writeln!(out, "Total Files: {}", format_count(totals.files))?;
    writeln!(out, "Total Directories: {}", format_count(totals.directories))?;
    writeln!(out, "Total Size: {}", format_size(totals.bytes))?;
    writeln!(out, "Scan Time: {:.2} seconds", result.elapsed_seconds)?;
    writeln!(out, "Scan Rate: {:.2} entries/sec", result.scan_rate())?;
    if totals.errors > 0 {
        writeln!(out, "Errors: {}", format_count(totals.errors))?;
    }
    if totals.unscanned_dirs > 0 {
        writeln!(
            out,
            "Unscanned Directories: {}",
            format_count(totals.unscanned_dirs)
        )?;
    }
    Ok(())
}
