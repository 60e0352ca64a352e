//! # posix-du
//!
//! Estimate the disk space used by file hierarchies, the way POSIX `du` does.
//!
//! Sizes are allocation-rounded: a file's length is rounded up to whole
//! filesystem blocks, that allocation is rounded up to whole display units
//! (512 bytes, or 1024 with `-k`), and a directory's size is its own
//! allocation plus everything beneath it.
//!
//! ## Layout
//!
//! - [`fs`] - the filesystem capability the walker reads through, with an OS
//!   implementation and an in-memory one
//! - [`tree`] - walks a hierarchy once and builds an owned size tree
//! - [`report`] - renders a finished tree as `du` lines, any number of times
//! - [`output`] - the same report as JSON
//! - [`diagnostics`] - where recoverable errors go
//! - [`config`] - scan, report and config-file options
//! - [`utils`] - size conversion helpers
//!
//! ## Example
//!
//! ```no_run
//! use std::{io, path::Path};
//!
//! use posix_du::{
//!     config::{DEFAULT_UNIT_SIZE, ReportOptions},
//!     report::{LineTemplate, format_tree, write_lines},
//!     tree::build_tree,
//! };
//!
//! let root = build_tree(Path::new("."), DEFAULT_UNIT_SIZE);
//! let options = ReportOptions::new(false, true).unwrap();
//! let lines = format_tree(&root, &LineTemplate::default(), &options);
//! write_lines(&mut io::stdout().lock(), lines).unwrap();
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod output;
pub mod report;
pub mod tree;
pub mod utils;

pub use crate::config::{Dereference, ReportOptions, ScanOptions, SizeStyle};
pub use crate::diagnostics::{CollectedDiagnostics, Diagnostics, StderrDiagnostics};
pub use crate::error::{DuError, Result};
pub use crate::fs::{FileSystem, OsFileSystem};
pub use crate::report::{LineTemplate, format_tree, report_entries, write_lines};
pub use crate::tree::{DirectoryNode, FileEntry, TreeBuilder, build_tree};
pub use crate::utils::{SizeConverter, convert};
