/// Report writers: CSV with human-readable sizes, JSON with the raw result.
use crate::args::ReportFormat;
use anyhow::{Context, Result};
use foldersize_core::model::size::format_size;
use foldersize_core::ScanResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Path as written in the report: `/` for the root, otherwise relative to it.
pub fn display_path(root: &Path, path: &Path) -> String {
    if path == root {
        return "/".to_string();
    }
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Write `Folder Path,Size` rows, one per entry.
pub fn write_csv<W: Write>(result: &ScanResult, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Folder Path", "Size"])?;
    for entry in &result.entries {
        writer.write_record([
            display_path(&result.root, &entry.path),
            format_size(entry.size),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(result: &ScanResult, out: W) -> Result<()> {
    serde_json::to_writer_pretty(out, result)?;
    Ok(())
}

/// Write the report for `result` to `path` in the chosen format.
pub fn write_report(result: &ScanResult, path: &Path, format: ReportFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    match format {
        ReportFormat::Csv => write_csv(result, &mut out),
        ReportFormat::Json => write_json(result, &mut out),
    }
    .with_context(|| format!("Failed to write report {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to flush report {}", path.display()))?;
    Ok(())
}
