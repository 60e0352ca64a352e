//! Command-line interface definition and argument parsing.
//!
//! This module defines all command-line arguments and options using the
//! [clap](https://docs.rs/clap/) library. The flag set follows POSIX `du`
//! (`-a`, `-s`, `-k`, `-x`, `-H`, `-L`) with a few extensions.
//!
//! Helper methods on [`Cli`] accept a [`FileConfig`] reference so that config-file
//! values act as defaults that CLI arguments can override (layered config).
//!
//! Option conflicts (`-a` with `-s`, `-k` with `--unit-size`) are not clap
//! errors: they are returned from the helpers as
//! [`DuError::ConflictingOptions`] so that they are reported like every other
//! fatal error, before anything is measured.

use std::{num::NonZeroU64, path::PathBuf};

use clap::{Parser, ValueEnum};

use posix_du::{
    config::{
        DEFAULT_UNIT_SIZE, Dereference, KILOBYTE_UNIT_SIZE, ReportOptions, ScanOptions,
        SizeStyle,
        file::{FileConfig, expand_tilde},
    },
    error::{DuError, Result},
    utils::parse_unit_size,
};

/// Command-line arguments that shape the report.
#[derive(Parser)]
#[allow(clippy::struct_excessive_bools)]
struct DisplayArgs {
    /// Write counts for all files, not just directories
    #[arg(short = 'a', long)]
    all: bool,

    /// Only write the total for each operand
    #[arg(short = 's', long, visible_alias = "summarize")]
    summarise: bool,

    /// Use 1024-byte units instead of the default 512-byte units
    #[arg(short = 'k', long)]
    kilobytes: bool,

    /// Use a custom display unit (e.g. 4096, 4K, 1MiB)
    ///
    /// Binary multiples only. Cannot be combined with -k.
    #[arg(long, value_name = "SIZE")]
    unit_size: Option<String>,

    /// Print sizes as human readable bytes (e.g. 11 MiB)
    #[arg(long)]
    human_readable: bool,
}

/// Command-line arguments for controlling directory scanning behavior.
///
/// These options affect how directories are traversed. `-H` and `-L` override
/// each other: the last one given wins.
#[derive(Parser)]
#[allow(clippy::struct_excessive_bools)]
struct ScanningArgs {
    /// Follow symbolic links given on the command line
    #[arg(short = 'H', long, overrides_with = "dereference")]
    dereference_args: bool,

    /// Follow all symbolic links
    #[arg(short = 'L', long, overrides_with = "dereference_args")]
    dereference: bool,

    /// Skip directories on different file systems
    #[arg(short = 'x', long)]
    one_file_system: bool,

    /// The number of threads to use for directory scanning
    ///
    /// A value of 0 uses the default number of threads (typically the number of CPU cores).
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Show a progress spinner on stderr while scanning
    #[arg(long)]
    progress: bool,
}

/// Main command-line interface structure.
///
/// Helper methods accept a [`FileConfig`] reference so that config-file values act as
/// defaults when the corresponding CLI argument is not provided.
#[derive(Parser)]
#[command(name = "posix-du")]
#[command(about = "Estimate file space usage")]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Files and directories to measure
    ///
    /// Defaults to the config file `paths`, then to the current directory.
    #[arg(num_args = 0.., value_name = "FILE")]
    paths: Vec<PathBuf>,

    /// Output results as a single JSON object for scripting/piping
    #[arg(long)]
    json: bool,

    /// Display options
    #[command(flatten)]
    display: DisplayArgs,

    /// Scanning options
    #[command(flatten)]
    scanning: ScanningArgs,
}

/// Unit size implied by a `-k` flag and a `--unit-size` value from one source.
fn unit_size_from(kilobytes: bool, unit_size: Option<&str>) -> Result<Option<NonZeroU64>> {
    match (kilobytes, unit_size) {
        (true, Some(_)) => Err(DuError::ConflictingOptions(
            "cannot use both -k and --unit-size".to_string(),
        )),
        (true, None) => Ok(Some(KILOBYTE_UNIT_SIZE)),
        (false, Some(text)) => parse_unit_size(text).map(Some),
        (false, None) => Ok(None),
    }
}

impl Cli {
    /// Whether `--json` structured output mode is enabled.
    #[must_use]
    pub const fn json(&self) -> bool {
        self.json
    }

    /// Resolve the operands from CLI args, config file, or default.
    ///
    /// Priority: CLI arguments > config file `paths` > current directory (`.`).
    /// Tilde expansion is applied to paths originating from the config file.
    #[must_use]
    pub fn paths(&self, config: &FileConfig) -> Vec<PathBuf> {
        if !self.paths.is_empty() {
            return self.paths.clone();
        }

        if let Some(ref paths) = config.paths
            && !paths.is_empty()
        {
            return paths.iter().map(|p| expand_tilde(p)).collect();
        }

        vec![PathBuf::from(".")]
    }

    /// Resolve the display unit size.
    ///
    /// Priority: `-k` / `--unit-size` > config `kilobytes` / `unit_size` > 512.
    ///
    /// # Errors
    ///
    /// Fails when one source asks for both `-k` and a unit size, or when a
    /// unit size cannot be parsed.
    pub fn unit_size(&self, config: &FileConfig) -> Result<NonZeroU64> {
        if let Some(size) =
            unit_size_from(self.display.kilobytes, self.display.unit_size.as_deref())?
        {
            return Ok(size);
        }

        let from_config = unit_size_from(
            config.display.kilobytes.unwrap_or(false),
            config.display.unit_size.as_deref(),
        )?;
        Ok(from_config.unwrap_or(DEFAULT_UNIT_SIZE))
    }

    /// Resolve the symlink policy.
    ///
    /// Priority: `-H` / `-L` > config `dereference` > never follow.
    #[must_use]
    pub fn dereference(&self, config: &FileConfig) -> Dereference {
        if self.scanning.dereference {
            return Dereference::All;
        }
        if self.scanning.dereference_args {
            return Dereference::Args;
        }

        config
            .scanning
            .dereference
            .as_ref()
            .and_then(|s| Dereference::from_str(s, true).ok())
            .unwrap_or_default()
    }

    /// Extract scanning options from CLI args and config file.
    ///
    /// - **unit size**: see [`Cli::unit_size`]
    /// - **threads**: CLI > config > `0` (default)
    /// - **boolean flags**: CLI flag `||` config value `||` `false`
    ///
    /// # Errors
    ///
    /// Propagates unit size errors.
    pub fn scan_options(&self, config: &FileConfig) -> Result<ScanOptions> {
        Ok(ScanOptions {
            unit_size: self.unit_size(config)?,
            dereference: self.dereference(config),
            one_file_system: self.scanning.one_file_system
                || config.scanning.one_file_system.unwrap_or(false),
            threads: self
                .scanning
                .threads
                .or(config.scanning.threads)
                .unwrap_or(0),
            progress: self.scanning.progress || config.scanning.progress.unwrap_or(false),
        })
    }

    /// Extract report options from CLI args and config file.
    ///
    /// When either `-a` or `-s` is given on the command line, the config file
    /// values for both are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DuError::ConflictingOptions`] when both `-a` and `-s` apply.
    pub fn report_options(&self, config: &FileConfig) -> Result<ReportOptions> {
        let (all, summarise) = if self.display.all || self.display.summarise {
            (self.display.all, self.display.summarise)
        } else {
            (
                config.display.all.unwrap_or(false),
                config.display.summarise.unwrap_or(false),
            )
        };

        let human =
            self.display.human_readable || config.display.human_readable.unwrap_or(false);
        let style = if human {
            SizeStyle::Human
        } else {
            SizeStyle::Units
        };

        Ok(ReportOptions::new(all, summarise)?.with_size_style(style))
    }
}
