//! Configuration file support for persistent settings.
//!
//! Settings are read from `~/.config/posix-du/config.toml` (or the
//! platform-specific equivalent). Configuration file values serve as defaults
//! that can be overridden by CLI arguments.
//!
//! # Layering
//!
//! The precedence order is: **CLI argument > config file > hardcoded default**.
//!
//! # Example config
//!
//! ```toml
//! # Operands used when none are given on the command line
//! paths = ["~/Downloads", "/var/log"]
//!
//! [display]
//! kilobytes = true        # same as -k
//! # unit_size = "4KiB"    # any display unit; conflicts with kilobytes
//! all = false
//! summarise = false
//! human_readable = false
//!
//! [scanning]
//! threads = 4
//! one_file_system = false
//! dereference = "none"    # "none", "args" (-H) or "all" (-L)
//! progress = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration file structure.
///
/// All fields are `Option<T>` so we can detect which values are present in the
/// config file and apply layered configuration (CLI > config file > defaults).
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default operands
    pub paths: Option<Vec<PathBuf>>,

    /// Presentation options
    #[serde(default)]
    pub display: FileDisplayConfig,

    /// Scanning options
    #[serde(default)]
    pub scanning: FileScanConfig,
}

/// Presentation options from the configuration file.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileDisplayConfig {
    /// Use 1024-byte units
    pub kilobytes: Option<bool>,

    /// Explicit display unit (e.g. `"4KiB"`)
    pub unit_size: Option<String>,

    /// Report every file
    pub all: Option<bool>,

    /// Report operand totals only
    pub summarise: Option<bool>,

    /// Human readable sizes
    pub human_readable: Option<bool>,
}

/// Scanning options from the configuration file.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileScanConfig {
    /// Number of threads for scanning
    pub threads: Option<usize>,

    /// Stay on the operand's filesystem
    pub one_file_system: Option<bool>,

    /// Symlink policy (`"none"`, `"args"`, `"all"`)
    pub dereference: Option<String>,

    /// Show a progress spinner
    pub progress: Option<bool>,
}

/// Expand a leading `~` in a path to the user's home directory.
///
/// Paths that don't start with `~` are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

impl FileConfig {
    /// Returns the path where the configuration file is expected.
    ///
    /// `None` if the platform config directory cannot be determined.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("posix-du").join("config.toml"))
    }

    /// Load configuration from the default config file location.
    ///
    /// A missing file yields the default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML
    /// or unknown keys.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file at {}: {e}", path.display())
        })?;

        toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file at {}: {e}", path.display())
        })
    }
}
