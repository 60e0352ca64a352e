//! An in-memory filesystem.
//!
//! Used to exercise the tree builder with exact block sizes, devices and
//! failures that are hard to reproduce on a real disk. Paths are keys: `./a`
//! and `a` name the same object, and symlink targets are full keys.

use std::{
    collections::{HashMap, HashSet},
    ffi::OsString,
    io,
    path::{Component, Path, PathBuf},
};

use super::{DirEntryMeta, EntryKind, EntryMeta, FileSystem};
use crate::error::{DuError, Result};

/// Length reported for directories created without an explicit size.
const DEFAULT_DIR_LEN: u64 = 4096;

/// Device of everything not placed under a mount.
const ROOT_DEVICE: u64 = 1;

/// Symlink hops followed before giving up.
const MAX_LINK_HOPS: usize = 40;

#[derive(Clone, Debug)]
struct Node {
    meta: EntryMeta,
    children: Vec<OsString>,
    target: Option<PathBuf>,
}

/// In-memory [`FileSystem`] built with chained `with_*` calls.
///
/// ```
/// # use posix_du::fs::MemoryFileSystem;
/// let fs = MemoryFileSystem::new(4096)
///     .with_file("data/under_4k.txt", 3456)
///     .with_file("data/subdir/big.bin", 5678 * 1024);
/// ```
#[derive(Clone, Debug)]
pub struct MemoryFileSystem {
    nodes: HashMap<PathBuf, Node>,
    block_sizes: HashMap<u64, u64>,
    denied_listings: HashSet<PathBuf>,
    broken_entries: HashSet<PathBuf>,
    next_inode: u64,
}

/// Drop `.` components so lookups do not depend on how a path was spelled.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl MemoryFileSystem {
    /// Create an empty filesystem whose root device uses `block_size`.
    #[must_use]
    pub fn new(block_size: u64) -> Self {
        Self {
            nodes: HashMap::new(),
            block_sizes: HashMap::from([(ROOT_DEVICE, block_size)]),
            denied_listings: HashSet::new(),
            broken_entries: HashSet::new(),
            next_inode: 1,
        }
    }

    /// Add a directory (and any missing parents).
    #[must_use]
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.with_sized_dir(path, DEFAULT_DIR_LEN)
    }

    /// Add a directory whose own stat length is `len` bytes.
    #[must_use]
    pub fn with_sized_dir(mut self, path: impl AsRef<Path>, len: u64) -> Self {
        let key = normalize(path.as_ref());
        self.insert(&key, EntryKind::Directory, len, None);
        self
    }

    /// Add a regular file of `len` bytes (and any missing parent directories).
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, len: u64) -> Self {
        let key = normalize(path.as_ref());
        self.insert(&key, EntryKind::File, len, None);
        self
    }

    /// Add a symbolic link at `path` pointing to the key `target`.
    #[must_use]
    pub fn with_symlink(mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        let key = normalize(path.as_ref());
        let len = target.as_ref().as_os_str().len() as u64;
        self.insert(&key, EntryKind::Symlink, len, Some(normalize(target.as_ref())));
        self
    }

    /// Add a directory that is the root of another filesystem.
    ///
    /// Everything created beneath it afterwards lives on `device`, whose
    /// block size is `block_size`.
    #[must_use]
    pub fn with_mount(mut self, path: impl AsRef<Path>, device: u64, block_size: u64) -> Self {
        let key = normalize(path.as_ref());
        self.insert(&key, EntryKind::Directory, DEFAULT_DIR_LEN, None);
        self.set_device(&key, device);
        self.block_sizes.insert(device, block_size);
        self
    }

    /// Make listing the directory at `path` fail with `PermissionDenied`.
    #[must_use]
    pub fn with_denied_listing(mut self, path: impl AsRef<Path>) -> Self {
        self.denied_listings.insert(normalize(path.as_ref()));
        self
    }

    /// Make `path` show up in its parent's listing as an unreadable entry.
    #[must_use]
    pub fn with_broken_entry(mut self, path: impl AsRef<Path>) -> Self {
        self.broken_entries.insert(normalize(path.as_ref()));
        self
    }

    /// Make every block size probe fail.
    #[must_use]
    pub fn with_failing_block_size(mut self) -> Self {
        self.block_sizes.clear();
        self
    }

    /// Insert a node on its parent's device, creating parents as needed.
    fn insert(&mut self, key: &Path, kind: EntryKind, len: u64, target: Option<PathBuf>) {
        let device = match key.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if !self.nodes.contains_key(parent) {
                    self.insert(parent, EntryKind::Directory, DEFAULT_DIR_LEN, None);
                }
                self.register_child(parent, key);
                self.nodes
                    .get(parent)
                    .and_then(|p| p.meta.device)
                    .unwrap_or(ROOT_DEVICE)
            }
            _ => ROOT_DEVICE,
        };

        let inode = self.next_inode;
        self.next_inode += 1;

        let children = self
            .nodes
            .remove(key)
            .map(|existing| existing.children)
            .unwrap_or_default();

        self.nodes.insert(
            key.to_path_buf(),
            Node {
                meta: EntryMeta {
                    kind,
                    len,
                    device: Some(device),
                    inode: Some(inode),
                },
                children,
                target,
            },
        );
    }

    fn register_child(&mut self, parent: &Path, child: &Path) {
        let Some(name) = child.file_name() else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent)
            && !node.children.iter().any(|c| c == name)
        {
            node.children.push(name.to_os_string());
        }
    }

    fn set_device(&mut self, key: &Path, device: u64) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.meta.device = Some(device);
        }
    }

    /// Resolve `path` to a key, following symlinks in every component except
    /// possibly the last one.
    fn resolve(&self, path: &Path, follow_last: bool) -> Result<PathBuf> {
        let components: Vec<OsString> = normalize(path)
            .components()
            .map(|c| c.as_os_str().to_os_string())
            .collect();
        let mut current = PathBuf::new();

        for (index, component) in components.iter().enumerate() {
            current.push(component);
            let is_last = index + 1 == components.len();
            if is_last && !follow_last {
                break;
            }

            let mut hops = 0;
            while let Some(target) = self.nodes.get(&current).and_then(|n| n.target.as_ref()) {
                if hops == MAX_LINK_HOPS {
                    return Err(DuError::from_io(
                        path,
                        io::Error::other("too many levels of symbolic links"),
                    ));
                }
                current.clone_from(target);
                hops += 1;
            }
        }

        if self.nodes.contains_key(&current) {
            Ok(current)
        } else {
            Err(DuError::NotFound {
                path: path.to_path_buf(),
            })
        }
    }

    fn node(&self, path: &Path, follow_last: bool) -> Result<(PathBuf, &Node)> {
        let key = self.resolve(path, follow_last)?;
        self.nodes
            .get(&key)
            .map(|node| (key, node))
            .ok_or_else(|| DuError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

impl FileSystem for MemoryFileSystem {
    fn inspect(&self, path: &Path, follow_links: bool) -> Result<EntryMeta> {
        self.node(path, follow_links).map(|(_, node)| node.meta.clone())
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<Result<DirEntryMeta>>> {
        let (key, node) = self.node(path, true)?;

        if self.denied_listings.contains(&key) {
            return Err(DuError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        if !node.meta.is_dir() {
            return Err(DuError::from_io(
                path,
                io::Error::other("not a directory"),
            ));
        }

        let entries = node
            .children
            .iter()
            .map(|name| {
                let child_key = key.join(name);
                if self.broken_entries.contains(&child_key) {
                    return Err(DuError::from_io(
                        &path.join(name),
                        io::Error::other("input/output error"),
                    ));
                }
                self.nodes
                    .get(&child_key)
                    .map(|child| DirEntryMeta {
                        name: name.clone(),
                        meta: child.meta.clone(),
                    })
                    .ok_or_else(|| DuError::NotFound {
                        path: path.join(name),
                    })
            })
            .collect();

        Ok(entries)
    }

    fn block_size(&self, path: &Path) -> Result<u64> {
        let probe_failed = |reason: &str| DuError::BlockSizeProbeFailed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let (_, node) = self
            .node(path, true)
            .map_err(|_| probe_failed("no such file or directory"))?;
        let device = node.meta.device.unwrap_or(ROOT_DEVICE);

        self.block_sizes
            .get(&device)
            .copied()
            .ok_or_else(|| probe_failed("statfs unavailable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: Vec<Result<DirEntryMeta>>) -> Vec<String> {
        entries
            .into_iter()
            .map(|e| e.unwrap().name.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_parents_are_created() {
        let fs = MemoryFileSystem::new(4096).with_file("a/b/c.txt", 10);

        assert!(fs.inspect(Path::new("a"), false).unwrap().is_dir());
        assert!(fs.inspect(Path::new("a/b"), false).unwrap().is_dir());
        assert_eq!(fs.inspect(Path::new("a/b/c.txt"), false).unwrap().len, 10);
    }

    #[test]
    fn test_listing_keeps_insertion_order() {
        let fs = MemoryFileSystem::new(4096)
            .with_file("root/zeta", 1)
            .with_file("root/alpha", 1)
            .with_dir("root/mid");

        let entries = fs.list_entries(Path::new("root")).unwrap();
        assert_eq!(names(entries), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_dot_prefix_is_ignored() {
        let fs = MemoryFileSystem::new(4096).with_file("root/file", 1);
        assert!(fs.inspect(Path::new("./root"), false).unwrap().is_dir());
        assert_eq!(names(fs.list_entries(Path::new("./root")).unwrap()), vec!["file"]);
    }

    #[test]
    fn test_missing_path() {
        let fs = MemoryFileSystem::new(4096);
        assert!(matches!(
            fs.inspect(Path::new("nope"), true),
            Err(DuError::NotFound { .. })
        ));
    }

    #[test]
    fn test_symlinks() {
        let fs = MemoryFileSystem::new(4096)
            .with_file("real/file", 100)
            .with_symlink("link", "real");

        assert!(fs.inspect(Path::new("link"), false).unwrap().is_symlink());
        assert!(fs.inspect(Path::new("link"), true).unwrap().is_dir());
        assert_eq!(fs.inspect(Path::new("link/file"), false).unwrap().len, 100);
        assert_eq!(names(fs.list_entries(Path::new("link")).unwrap()), vec!["file"]);
    }

    #[test]
    fn test_symlink_cycle_is_an_error() {
        let fs = MemoryFileSystem::new(4096)
            .with_symlink("a", "b")
            .with_symlink("b", "a");

        assert!(matches!(
            fs.inspect(Path::new("a"), true),
            Err(DuError::Io { .. })
        ));
    }

    #[test]
    fn test_mounts_have_their_own_device_and_block_size() {
        let fs = MemoryFileSystem::new(4096)
            .with_dir("root")
            .with_mount("root/mnt", 7, 1024)
            .with_file("root/mnt/file", 1);

        let root = fs.inspect(Path::new("root"), false).unwrap();
        let file = fs.inspect(Path::new("root/mnt/file"), false).unwrap();

        assert_eq!(root.device, Some(ROOT_DEVICE));
        assert_eq!(file.device, Some(7));
        assert_eq!(fs.block_size(Path::new("root")).unwrap(), 4096);
        assert_eq!(fs.block_size(Path::new("root/mnt/file")).unwrap(), 1024);
    }

    #[test]
    fn test_injected_failures() {
        let fs = MemoryFileSystem::new(4096)
            .with_file("root/good", 1)
            .with_file("root/bad", 1)
            .with_dir("locked")
            .with_denied_listing("locked")
            .with_broken_entry("root/bad")
            .with_failing_block_size();

        assert!(matches!(
            fs.list_entries(Path::new("locked")),
            Err(DuError::PermissionDenied { .. })
        ));

        let entries = fs.list_entries(Path::new("root")).unwrap();
        assert!(entries[0].is_ok());
        assert!(entries[1].is_err());

        assert!(matches!(
            fs.block_size(Path::new("root")),
            Err(DuError::BlockSizeProbeFailed { .. })
        ));
    }
}
