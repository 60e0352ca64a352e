//! Turning a size tree into report lines.
//!
//! Reporting never touches the filesystem: it walks a finished
//! [`DirectoryNode`] read-only, so the same tree can be printed with different
//! flags, or printed twice, and the output is the same every time.
//!
//! Entries come out in `du` order. When files are listed they precede the
//! subdirectories of their directory, and a directory's own line always comes
//! after everything beneath it.

use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use serde::Serialize;

use crate::{
    config::{ReportOptions, SizeStyle},
    tree::DirectoryNode,
    utils::format_units,
};

/// Whether a report entry is a file or a directory total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    File,
    Directory,
}

/// One line of a report, before rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    /// File or directory
    pub kind: ReportKind,

    /// Cleaned path as it is displayed
    pub path: PathBuf,

    /// Size in display units
    pub size: u64,

    /// Display unit in bytes
    pub unit_size: u64,
}

impl ReportEntry {
    /// Number of bytes the size stands for.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.size.saturating_mul(self.unit_size)
    }

    /// The size column in the requested style.
    #[must_use]
    pub fn size_text(&self, style: SizeStyle) -> String {
        match style {
            SizeStyle::Units => self.size.to_string(),
            SizeStyle::Human => format_units(self.size, self.unit_size),
        }
    }
}

/// Layout of a rendered line, with `{size}` and `{path}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineTemplate(String);

impl LineTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Substitute the placeholders. The path is inserted as raw `OsStr`, so
    /// names that are not valid UTF-8 come through unchanged.
    #[must_use]
    pub fn render(&self, size: &str, path: &Path) -> OsString {
        let text = self.0.replace("{size}", size);
        let mut pieces = text.split("{path}");
        let mut line = OsString::from(pieces.next().unwrap_or_default());

        for piece in pieces {
            line.push(path.as_os_str());
            line.push(piece);
        }
        line
    }
}

impl Default for LineTemplate {
    fn default() -> Self {
        Self::new("{size}\t{path}")
    }
}

/// Collect the entries of a report on `root`, in output order.
#[must_use]
pub fn report_entries(root: &DirectoryNode, options: &ReportOptions) -> Vec<ReportEntry> {
    let mut entries = Vec::new();
    collect(root, *options, &mut entries);
    entries
}

fn collect(node: &DirectoryNode, options: ReportOptions, out: &mut Vec<ReportEntry>) {
    if options.list_all() {
        out.extend(node.files().iter().map(|file| ReportEntry {
            kind: ReportKind::File,
            path: display_path(file.path()),
            size: file.size(),
            unit_size: node.unit_size(),
        }));
    }

    if !options.summarise() {
        for child in node.children() {
            collect(child, options, out);
        }
    }

    out.push(ReportEntry {
        kind: ReportKind::Directory,
        path: display_path(node.path()),
        size: node.size(),
        unit_size: node.unit_size(),
    });
}

/// Render a report on `root` as lines, without line terminators.
#[must_use]
pub fn format_tree(
    root: &DirectoryNode,
    template: &LineTemplate,
    options: &ReportOptions,
) -> Vec<OsString> {
    report_entries(root, options)
        .iter()
        .map(|entry| template.render(&entry.size_text(options.size_style()), &entry.path))
        .collect()
}

/// Write `lines` to `out`, one per line, byte for byte where the platform
/// allows it.
///
/// # Errors
///
/// Returns the first write error from `out`.
pub fn write_lines<W, L>(out: &mut W, lines: impl IntoIterator<Item = L>) -> io::Result<()>
where
    W: Write,
    L: AsRef<OsStr>,
{
    for line in lines {
        out.write_all(&line_bytes(line.as_ref()))?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(unix)]
fn line_bytes(line: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;

    Cow::Borrowed(line.as_bytes())
}

#[cfg(not(unix))]
fn line_bytes(line: &OsStr) -> Cow<'_, [u8]> {
    match line.to_string_lossy() {
        Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
        Cow::Owned(text) => Cow::Owned(text.into_bytes()),
    }
}

/// Lexically simplify a path: drop `.` components and fold `name/..` pairs.
///
/// Leading `..` of a relative path are kept; `..` directly under the root
/// disappears. An empty result becomes `.`.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

/// Prefix relative paths with `./` unless they already start with a dot.
#[must_use]
pub fn fix_path(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::from(".");
    }
    if path.is_absolute() || path.as_os_str().as_encoded_bytes().starts_with(b".") {
        return path.to_path_buf();
    }
    Path::new(".").join(path)
}

/// The form in which a path appears in a report.
#[must_use]
pub fn display_path(path: &Path) -> PathBuf {
    fix_path(&clean_path(path))
}
