//! Directory tree size accumulation.
//!
//! [`TreeBuilder`] walks a hierarchy once, depth first, and returns an owned
//! [`DirectoryNode`] tree whose sizes are already rolled up. Nothing is
//! computed lazily and nothing is mutated afterwards, so one tree can be
//! reported as many times as needed.
//!
//! Failures never abort a walk. An operand that cannot be inspected still
//! produces a node worth one allocation unit, an unreadable directory keeps
//! its own allocation, and an unreadable entry is left out. Every such case is
//! handed to the [`Diagnostics`] sink.

use std::{
    num::NonZeroU64,
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rayon::prelude::*;

use crate::{
    config::ScanOptions,
    diagnostics::{Diagnostics, StderrDiagnostics},
    error::DuError,
    fs::{DirEntryMeta, EntryMeta, FileId, FileSystem, OsFileSystem},
    utils::SizeConverter,
};

/// Block size assumed when the filesystem cannot be asked.
pub const FALLBACK_BLOCK_SIZE: NonZeroU64 = match NonZeroU64::new(4096) {
    Some(size) => size,
    None => unreachable!(),
};

/// A non-directory object found inside a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    path: PathBuf,
    size: u64,
}

impl FileEntry {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocation-rounded size in display units.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// A directory and everything beneath it.
///
/// Operands that are not directories are represented as nodes without files
/// or children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryNode {
    path: PathBuf,
    size: u64,
    own_size: u64,
    files: Vec<FileEntry>,
    children: Vec<DirectoryNode>,
    block_size: u64,
    unit_size: u64,
}

impl DirectoryNode {
    fn new(
        path: &Path,
        own_size: u64,
        files: Vec<FileEntry>,
        children: Vec<Self>,
        converter: SizeConverter,
    ) -> Self {
        let size = files
            .iter()
            .map(FileEntry::size)
            .chain(children.iter().map(Self::size))
            .fold(own_size, u64::saturating_add);

        Self {
            path: path.to_path_buf(),
            size,
            own_size,
            files,
            children,
            block_size: converter.block_size(),
            unit_size: converter.unit_size(),
        }
    }

    fn leaf(path: &Path, own_size: u64, converter: SizeConverter) -> Self {
        Self::new(path, own_size, Vec::new(), Vec::new(), converter)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cumulative size in display units.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// The allocation of the directory object itself, in display units.
    #[must_use]
    pub const fn own_size(&self) -> u64 {
        self.own_size
    }

    /// Files directly inside this directory, in listing order.
    #[must_use]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Subdirectories, in listing order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Filesystem block size used for this node, in bytes.
    #[must_use]
    pub const fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Display unit size, in bytes.
    #[must_use]
    pub const fn unit_size(&self) -> u64 {
        self.unit_size
    }
}

/// Per-branch state carried down the recursion.
#[derive(Clone, Debug, Default)]
struct Walk {
    depth: usize,
    root_device: Option<u64>,
    ancestors: Vec<FileId>,
}

impl Walk {
    /// State for the entries of the directory described by `meta`.
    fn enter(&self, meta: &EntryMeta) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.extend(meta.file_id());

        Self {
            depth: self.depth + 1,
            root_device: self.root_device.or(meta.device),
            ancestors,
        }
    }
}

/// What one listing entry turned into.
enum Visit {
    File(FileEntry),
    Directory(PathBuf),
    Skip,
}

/// Builds [`DirectoryNode`] trees from a [`FileSystem`].
///
/// Sibling subdirectories are built in parallel on the rayon pool; children
/// keep their listing order regardless.
#[derive(Debug)]
pub struct TreeBuilder<'a, F: FileSystem, D: Diagnostics> {
    fs: &'a F,
    diagnostics: &'a D,
    options: ScanOptions,
}

impl<'a, F: FileSystem, D: Diagnostics> TreeBuilder<'a, F, D> {
    #[must_use]
    pub const fn new(fs: &'a F, diagnostics: &'a D, options: ScanOptions) -> Self {
        Self {
            fs,
            diagnostics,
            options,
        }
    }

    /// Walk the hierarchy rooted at `path` and return its size tree.
    ///
    /// Always returns a node: failures are reported to the diagnostics sink
    /// and replaced by best-effort sizes.
    #[must_use]
    pub fn build(&self, path: &Path) -> DirectoryNode {
        let progress = self.spinner(path);
        let node = self
            .build_node(path, &Walk::default(), &progress)
            .unwrap_or_else(|err| {
                self.diagnostics.report(&err);
                let converter = self.converter_for(path);
                DirectoryNode::leaf(path, converter.units(0), converter)
            });
        progress.finish_and_clear();
        node
    }

    fn spinner(&self, path: &Path) -> ProgressBar {
        if !self.options.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({pos} directories)")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("Scanning {}", path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Size converter for a node, probing the filesystem block size.
    fn converter_for(&self, path: &Path) -> SizeConverter {
        let block_size = match self.fs.block_size(path) {
            Ok(size) => NonZeroU64::new(size).unwrap_or_else(|| {
                debug!(
                    "{} reports 0-byte blocks; assuming {FALLBACK_BLOCK_SIZE}-byte blocks",
                    path.display()
                );
                FALLBACK_BLOCK_SIZE
            }),
            Err(err) => {
                debug!("{err}; assuming {FALLBACK_BLOCK_SIZE}-byte blocks");
                FALLBACK_BLOCK_SIZE
            }
        };

        SizeConverter::new(block_size, self.options.unit_size)
    }

    /// Measure the hierarchy at `path`. Only a failure to inspect `path`
    /// itself is returned; everything below it is reported and skipped.
    fn build_node(
        &self,
        path: &Path,
        walk: &Walk,
        progress: &ProgressBar,
    ) -> Result<DirectoryNode, DuError> {
        let follow = self.options.dereference.follows_at(walk.depth);
        let meta = self.fs.inspect(path, follow)?;

        let converter = self.converter_for(path);
        let own_size = converter.units(meta.len);
        if !meta.is_dir() {
            return Ok(DirectoryNode::leaf(path, own_size, converter));
        }
        progress.inc(1);

        let inner = walk.enter(&meta);
        let mut files = Vec::new();
        let mut subdirs = Vec::new();

        match self.fs.list_entries(path) {
            Ok(entries) => {
                for entry in entries {
                    let visit = match entry {
                        Ok(entry) => self.visit(path, entry, &inner, converter),
                        Err(err) => {
                            self.diagnostics.report(&err);
                            Visit::Skip
                        }
                    };

                    match visit {
                        Visit::File(file) => files.push(file),
                        Visit::Directory(dir) => subdirs.push(dir),
                        Visit::Skip => {}
                    }
                }
            }
            Err(err) => self.diagnostics.report(&err),
        }

        // Directories removed since the listing are skipped like any other
        // entry that cannot be inspected.
        let children: Vec<DirectoryNode> = subdirs
            .par_iter()
            .filter_map(|dir| {
                self.build_node(dir, &inner, progress)
                    .map_err(|err| self.diagnostics.report(&err))
                    .ok()
            })
            .collect();

        Ok(DirectoryNode::new(path, own_size, files, children, converter))
    }

    /// Decide what to do with one listing entry of `parent`.
    fn visit(
        &self,
        parent: &Path,
        entry: DirEntryMeta,
        walk: &Walk,
        converter: SizeConverter,
    ) -> Visit {
        let path = parent.join(&entry.name);

        let meta = if entry.meta.is_symlink() && self.options.dereference.follows_at(walk.depth) {
            match self.fs.inspect(&path, true) {
                Ok(meta) => meta,
                Err(err) => {
                    self.diagnostics.report(&err);
                    return Visit::Skip;
                }
            }
        } else {
            entry.meta
        };

        if !meta.is_dir() {
            let size = converter.units(meta.len);
            return Visit::File(FileEntry { path, size });
        }

        if self.options.one_file_system && meta.device.is_some() && meta.device != walk.root_device
        {
            debug!("skipping {}: different filesystem", path.display());
            return Visit::Skip;
        }

        if let Some(id) = meta.file_id()
            && walk.ancestors.contains(&id)
        {
            self.diagnostics.report(&DuError::FilesystemLoop { path });
            return Visit::Skip;
        }

        Visit::Directory(path)
    }
}

/// Measure `path` on the real filesystem with default scan options, sending
/// diagnostics to stderr.
#[must_use]
pub fn build_tree(path: &Path, unit_size: NonZeroU64) -> DirectoryNode {
    let fs = OsFileSystem::new();
    let diagnostics = StderrDiagnostics::new(env!("CARGO_PKG_NAME"));

    TreeBuilder::new(&fs, &diagnostics, ScanOptions::new(unit_size)).build(path)
}
