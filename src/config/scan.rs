//! Scanning configuration for directory traversal.
//!
//! This module defines the options that control how a file hierarchy is
//! walked: the display unit sizes are expressed in, how symbolic links are
//! treated, whether other filesystems are entered, and how much parallelism
//! is used.

use std::num::NonZeroU64;

use clap::ValueEnum;

/// POSIX default display unit, in bytes.
pub const DEFAULT_UNIT_SIZE: NonZeroU64 = match NonZeroU64::new(512) {
    Some(size) => size,
    None => unreachable!(),
};

/// Display unit selected by `-k`, in bytes.
pub const KILOBYTE_UNIT_SIZE: NonZeroU64 = match NonZeroU64::new(1024) {
    Some(size) => size,
    None => unreachable!(),
};

/// Symbolic link handling during traversal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum, Default)]
pub enum Dereference {
    /// Count links as themselves and never follow them
    #[default]
    #[value(name = "none")]
    Never,

    /// Follow links given as operands only (`-H`)
    Args,

    /// Follow every link (`-L`)
    All,
}

impl Dereference {
    /// Whether a link at the given depth (0 = operand) is followed.
    #[must_use]
    pub const fn follows_at(self, depth: usize) -> bool {
        match self {
            Self::Never => false,
            Self::Args => depth == 0,
            Self::All => true,
        }
    }
}

/// Configuration for directory scanning behavior.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Size of one display unit in bytes
    pub unit_size: NonZeroU64,

    /// Symbolic link policy
    pub dereference: Dereference,

    /// Skip directories that live on a different filesystem than the operand
    pub one_file_system: bool,

    /// Number of threads to use for scanning (0 = default)
    pub threads: usize,

    /// Show a spinner on stderr while scanning
    pub progress: bool,
}

impl ScanOptions {
    /// Options with the given unit size and every other knob at its default.
    #[must_use]
    pub const fn new(unit_size: NonZeroU64) -> Self {
        Self {
            unit_size,
            dereference: Dereference::Never,
            one_file_system: false,
            threads: 0,
            progress: false,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_default() {
        let scan_opts = ScanOptions::default();

        assert_eq!(scan_opts.unit_size.get(), 512);
        assert_eq!(scan_opts.dereference, Dereference::Never);
        assert!(!scan_opts.one_file_system);
        assert_eq!(scan_opts.threads, 0);
        assert!(!scan_opts.progress);
    }

    #[test]
    fn test_unit_size_constants() {
        assert_eq!(DEFAULT_UNIT_SIZE.get(), 512);
        assert_eq!(KILOBYTE_UNIT_SIZE.get(), 1024);
        assert_eq!(ScanOptions::new(KILOBYTE_UNIT_SIZE).unit_size, KILOBYTE_UNIT_SIZE);
    }

    #[test]
    fn test_scan_options_clone() {
        let original = ScanOptions {
            dereference: Dereference::All,
            one_file_system: true,
            threads: 4,
            ..ScanOptions::new(KILOBYTE_UNIT_SIZE)
        };
        let cloned = original.clone();

        assert_eq!(original.unit_size, cloned.unit_size);
        assert_eq!(original.dereference, cloned.dereference);
        assert_eq!(original.threads, cloned.threads);
    }

    #[test]
    fn test_dereference_depths() {
        assert!(!Dereference::Never.follows_at(0));
        assert!(!Dereference::Never.follows_at(3));
        assert!(Dereference::Args.follows_at(0));
        assert!(!Dereference::Args.follows_at(1));
        assert!(Dereference::All.follows_at(0));
        assert!(Dereference::All.follows_at(5));
    }

    #[test]
    fn test_dereference_value_names() {
        assert_eq!(
            Dereference::from_str("none", true).unwrap(),
            Dereference::Never
        );
        assert_eq!(Dereference::from_str("args", true).unwrap(), Dereference::Args);
        assert_eq!(Dereference::from_str("ALL", true).unwrap(), Dereference::All);
        assert!(Dereference::from_str("sometimes", true).is_err());
    }
}
