//! Structured JSON output for scripting and piping.
//!
//! This module provides serializable data structures that mirror the text
//! report. When the `--json` flag is passed, these structures are serialized
//! to stdout as a single JSON object, replacing the tab-separated lines.

use serde::Serialize;

use crate::{
    config::ReportOptions,
    report::{ReportEntry, ReportKind, report_entries},
    tree::DirectoryNode,
    utils::format_units,
};

/// Top-level JSON output emitted when `--json` is active.
#[derive(Serialize, Debug)]
pub struct JsonOutput {
    /// One report per operand, in command-line order.
    pub reports: Vec<JsonReport>,
}

/// The report for one operand.
#[derive(Serialize, Debug)]
pub struct JsonReport {
    /// Operand as displayed in the text report.
    pub path: String,

    /// Display unit in bytes.
    pub unit_size: u64,

    /// Cumulative size of the operand in display units.
    pub total: u64,

    /// Entries in the same order as the text report.
    pub entries: Vec<JsonEntry>,
}

/// A single file or directory line.
#[derive(Serialize, Debug)]
pub struct JsonEntry {
    /// JSON strings are UTF-8, so bytes that are not valid UTF-8 are replaced
    /// with U+FFFD. The text report keeps them.
    pub path: String,

    /// `"file"` or `"directory"`.
    pub kind: ReportKind,

    /// Size in display units.
    pub size: u64,

    /// Size in bytes (`size * unit_size`).
    pub bytes: u64,

    /// Human-readable formatted size (e.g. `"11.09 MiB"`).
    pub size_formatted: String,
}

impl JsonOutput {
    #[must_use]
    pub const fn new(reports: Vec<JsonReport>) -> Self {
        Self { reports }
    }
}

impl JsonReport {
    /// Build the report for one measured operand.
    #[must_use]
    pub fn from_tree(root: &DirectoryNode, options: &ReportOptions) -> Self {
        let entries: Vec<JsonEntry> = report_entries(root, options)
            .iter()
            .map(JsonEntry::from_entry)
            .collect();

        // The operand's own line is always last.
        let path = entries
            .last()
            .map(|entry| entry.path.clone())
            .unwrap_or_default();

        Self {
            path,
            unit_size: root.unit_size(),
            total: root.size(),
            entries,
        }
    }
}

impl JsonEntry {
    #[must_use]
    pub fn from_entry(entry: &ReportEntry) -> Self {
        Self {
            path: entry.path.to_string_lossy().into_owned(),
            kind: entry.kind,
            size: entry.size,
            bytes: entry.bytes(),
            size_formatted: format_units(entry.size, entry.unit_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::ScanOptions;
    use crate::diagnostics::CollectedDiagnostics;
    use crate::fs::MemoryFileSystem;
    use crate::tree::TreeBuilder;

    fn testdata() -> DirectoryNode {
        let fs = MemoryFileSystem::new(4096)
            .with_file("data/a.txt", 3456)
            .with_file("data/sub/b.txt", 5678);
        let diagnostics = CollectedDiagnostics::new();
        TreeBuilder::new(&fs, &diagnostics, ScanOptions::default()).build(Path::new("data"))
    }

    #[test]
    fn test_json_report_from_tree() {
        let options = ReportOptions::new(true, false).unwrap();
        let report = JsonReport::from_tree(&testdata(), &options);

        assert_eq!(report.path, "./data");
        assert_eq!(report.unit_size, 512);
        assert_eq!(report.total, 8 + 8 + 8 + 16);

        let paths: Vec<&str> = report.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["./data/a.txt", "./data/sub/b.txt", "./data/sub", "./data"]
        );
        assert_eq!(report.entries[0].bytes, 4096);
        assert_eq!(report.entries[0].size_formatted, "4 KiB");
    }

    #[test]
    fn test_json_serialization_shape() {
        let options = ReportOptions::new(false, true).unwrap();
        let output = JsonOutput::new(vec![JsonReport::from_tree(&testdata(), &options)]);

        let value = serde_json::to_value(&output).unwrap();
        let report = &value["reports"][0];
        assert_eq!(report["path"], "./data");
        assert_eq!(report["total"], 40);
        assert_eq!(report["entries"].as_array().unwrap().len(), 1);
        assert_eq!(report["entries"][0]["kind"], "directory");
        assert_eq!(report["entries"][0]["bytes"], 40 * 512);
    }

    #[test]
    fn test_json_file_kind() {
        let options = ReportOptions::new(true, false).unwrap();
        let report = JsonReport::from_tree(&testdata(), &options);

        let value = serde_json::to_value(&report.entries[0]).unwrap();
        assert_eq!(value["kind"], "file");
    }
}
