//! Filesystem access used by the tree builder.
//!
//! The builder never touches `std::fs` directly. It talks to a [`FileSystem`],
//! which answers three questions: what is at a path, what does a directory
//! contain, and what block size does the filesystem under a path use.
//!
//! Two implementations are provided:
//!
//! - [`OsFileSystem`] - the real filesystem (std, `walkdir`, `statfs(2)`)
//! - `MemoryFileSystem` - an in-memory hierarchy with injectable failures,
//!   built for tests and with the `test-util` feature

use std::ffi::OsString;
use std::path::Path;

use crate::error::Result;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod os;

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryFileSystem;
pub use os::OsFileSystem;

/// What kind of object a path refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory
    Directory,

    /// A regular file
    File,

    /// A symbolic link that was not followed
    Symlink,

    /// Anything else (fifo, socket, device node)
    Other,
}

/// Identity of an object on disk, used to detect directory cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId {
    pub device: u64,
    pub inode: u64,
}

/// Metadata of one filesystem object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryMeta {
    /// Object kind
    pub kind: EntryKind,

    /// Length in bytes as reported by stat
    pub len: u64,

    /// Device the object lives on, when the platform exposes it
    pub device: Option<u64>,

    /// Inode number, when the platform exposes it
    pub inode: Option<u64>,
}

impl EntryMeta {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    /// Device and inode pair, if both are known.
    #[must_use]
    pub fn file_id(&self) -> Option<FileId> {
        Some(FileId {
            device: self.device?,
            inode: self.inode?,
        })
    }
}

/// One entry of a directory listing.
///
/// `meta` describes the entry itself; symbolic links are not followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntryMeta {
    pub name: OsString,
    pub meta: EntryMeta,
}

/// Raw filesystem capabilities consumed by the tree builder.
///
/// Implementations must be shareable between threads because sibling
/// subtrees are built in parallel.
pub trait FileSystem: Sync {
    /// Inspect the object at `path`, following a final symlink if
    /// `follow_links` is set.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound`, `PermissionDenied` or `Io`.
    fn inspect(&self, path: &Path, follow_links: bool) -> Result<EntryMeta>;

    /// List the immediate entries of the directory at `path`.
    ///
    /// The outer error means the directory could not be read at all; inner
    /// errors concern a single entry and leave its siblings usable.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound`, `PermissionDenied` or `Io`.
    fn list_entries(&self, path: &Path) -> Result<Vec<Result<DirEntryMeta>>>;

    /// Block size of the filesystem holding `path`, in bytes.
    ///
    /// # Errors
    ///
    /// Fails with `BlockSizeProbeFailed`.
    fn block_size(&self, path: &Path) -> Result<u64>;
}
