//! # posix-du
//!
//! Estimate file space usage, following POSIX `du`.
//!
//! For every operand the tool walks the hierarchy once, rounds each file up
//! to whole filesystem blocks and reports cumulative sizes in 512-byte units
//! (1024 with `-k`). Errors on individual paths are reported on stderr and do
//! not change the exit status.
//!
//! ## Usage
//!
//! ```bash
//! # Every directory under the current one
//! posix-du
//!
//! # One total per operand, in kilobytes
//! posix-du -sk ~/Downloads /var/log
//!
//! # Every file, staying on one filesystem
//! posix-du -ax /
//! ```

mod cli;

use std::{io, process::exit};

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use env_logger::Env;
use log::debug;
use posix_du::{
    config::FileConfig,
    diagnostics::StderrDiagnostics,
    fs::OsFileSystem,
    output::{JsonOutput, JsonReport},
    report::{LineTemplate, format_tree, write_lines},
    tree::TreeBuilder,
};

/// Entry point for the posix-du application.
///
/// This function handles all errors gracefully by calling [`inner_main`] and printing
/// any errors to stderr before exiting with a non-zero status code.
fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = inner_main() {
        eprintln!("Error: {err}");

        exit(1);
    }
}

/// Main application logic that can return errors.
///
/// Every option is resolved and validated before the first operand is
/// measured, so a conflicting command line prints nothing on stdout.
///
/// # Errors
///
/// Returns option conflicts, unit size parse errors, thread-pool
/// configuration errors, JSON serialization errors and stdout write errors.
fn inner_main() -> Result<()> {
    let args = Cli::parse();
    let file_config = load_config();

    let paths = args.paths(&file_config);
    let scan_options = args.scan_options(&file_config)?;
    let report_options = args.report_options(&file_config)?;
    debug!("scan options: {scan_options:?}");
    debug!("report options: {report_options:?}");

    if scan_options.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(scan_options.threads)
            .build_global()?;
    }

    let fs = OsFileSystem::new();
    let diagnostics = StderrDiagnostics::new(env!("CARGO_PKG_NAME"));
    let builder = TreeBuilder::new(&fs, &diagnostics, scan_options);

    if args.json() {
        let reports = paths
            .iter()
            .map(|path| JsonReport::from_tree(&builder.build(path), &report_options))
            .collect();
        println!("{}", serde_json::to_string_pretty(&JsonOutput::new(reports))?);
    } else {
        let template = LineTemplate::default();
        let mut stdout = io::stdout().lock();
        for path in &paths {
            let root = builder.build(path);
            write_lines(&mut stdout, format_tree(&root, &template, &report_options))?;
        }
    }

    debug!("{} path(s) could not be read", diagnostics.count());
    Ok(())
}

/// Load the configuration file, falling back to defaults on failure.
fn load_config() -> FileConfig {
    match FileConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e}", "Warning: Failed to load config file:".yellow());
            FileConfig::default()
        }
    }
}
