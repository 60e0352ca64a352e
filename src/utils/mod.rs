//! Utility functions and helpers.
//!
//! This module contains the allocation rounding used by the tree builder and
//! the unit size parsing/formatting helpers used by the CLI and reports.

pub mod size;

pub use size::{SizeConverter, convert, format_units, parse_unit_size};
