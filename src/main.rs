//! folder-sizes: concurrent directory size scanner.
//!
//! Thin binary entry point. All logic lives in the `foldersize-core`
//! and `foldersize-cli` crates.

use clap::Parser;
use foldersize_cli::args::CliArgs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!(root = %args.mount_point.display(), "folder-sizes starting");

    match foldersize_cli::run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
