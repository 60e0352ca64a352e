//! Presentation options for size reports.
//!
//! `-a` and `-s` pull in opposite directions (every file versus one line per
//! operand), so [`ReportOptions`] refuses to hold both.

use crate::error::{DuError, Result};

/// How a size is rendered in a report line.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SizeStyle {
    /// Integer count of display units (POSIX output)
    #[default]
    Units,

    /// Human readable bytes, e.g. `4 KiB`
    Human,
}

/// Which entities a report contains and how their sizes look.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ReportOptions {
    list_all: bool,
    summarise: bool,
    size_style: SizeStyle,
}

impl ReportOptions {
    /// Validate and build the presentation flags.
    ///
    /// # Errors
    ///
    /// Returns [`DuError::ConflictingOptions`] when both `list_all` and
    /// `summarise` are set.
    pub fn new(list_all: bool, summarise: bool) -> Result<Self> {
        if list_all && summarise {
            return Err(DuError::ConflictingOptions(
                "cannot both summarise and show all entries".to_string(),
            ));
        }

        Ok(Self {
            list_all,
            summarise,
            size_style: SizeStyle::Units,
        })
    }

    /// Use a different size rendering.
    #[must_use]
    pub const fn with_size_style(mut self, size_style: SizeStyle) -> Self {
        self.size_style = size_style;
        self
    }

    /// Report every file, not just directories (`-a`).
    #[must_use]
    pub const fn list_all(&self) -> bool {
        self.list_all
    }

    /// Report only the operand totals (`-s`).
    #[must_use]
    pub const fn summarise(&self) -> bool {
        self.summarise
    }

    #[must_use]
    pub const fn size_style(&self) -> SizeStyle {
        self.size_style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_options_default() {
        let opts = ReportOptions::default();
        assert!(!opts.list_all());
        assert!(!opts.summarise());
        assert_eq!(opts.size_style(), SizeStyle::Units);
    }

    #[test]
    fn test_report_options_single_flags() {
        let all = ReportOptions::new(true, false).unwrap();
        assert!(all.list_all());
        assert!(!all.summarise());

        let summary = ReportOptions::new(false, true).unwrap();
        assert!(!summary.list_all());
        assert!(summary.summarise());
    }

    #[test]
    fn test_report_options_conflict() {
        let result = ReportOptions::new(true, true);
        assert!(matches!(result, Err(DuError::ConflictingOptions(_))));
    }

    #[test]
    fn test_with_size_style() {
        let opts = ReportOptions::new(false, false)
            .unwrap()
            .with_size_style(SizeStyle::Human);
        assert_eq!(opts.size_style(), SizeStyle::Human);
    }
}
