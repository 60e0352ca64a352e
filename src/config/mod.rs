//! Configuration types.
//!
//! - [`ScanOptions`] - how a hierarchy is walked
//! - [`ReportOptions`] - what a report shows
//! - [`FileConfig`] - persisted defaults from `config.toml`

pub mod file;
pub mod report;
pub mod scan;

pub use file::FileConfig;
pub use report::{ReportOptions, SizeStyle};
pub use scan::{DEFAULT_UNIT_SIZE, Dereference, KILOBYTE_UNIT_SIZE, ScanOptions};
