//! The real filesystem.

use std::{fs, path::Path};

use walkdir::WalkDir;

use super::{DirEntryMeta, EntryKind, EntryMeta, FileSystem};
use crate::error::{DuError, Result};

/// [`FileSystem`] backed by the operating system.
///
/// Directory listings are returned sorted by file name so reports are stable
/// from one run to the next.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EntryMeta {
    /// Convert std metadata, picking up device and inode numbers on Unix.
    #[must_use]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        #[cfg(unix)]
        let (device, inode) = {
            use std::os::unix::fs::MetadataExt;
            (Some(metadata.dev()), Some(metadata.ino()))
        };
        #[cfg(not(unix))]
        let (device, inode) = (None, None);

        Self {
            kind,
            len: metadata.len(),
            device,
            inode,
        }
    }
}

/// Turn a `walkdir` error into a [`DuError`], keeping the offending path.
fn walk_error(fallback: &Path, err: walkdir::Error) -> DuError {
    let path = err.path().unwrap_or(fallback).to_path_buf();

    match err.into_io_error() {
        Some(io_err) => DuError::from_io(&path, io_err),
        None => DuError::FilesystemLoop { path },
    }
}

impl FileSystem for OsFileSystem {
    fn inspect(&self, path: &Path, follow_links: bool) -> Result<EntryMeta> {
        let metadata = if follow_links {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        };

        metadata
            .map(|md| EntryMeta::from_metadata(&md))
            .map_err(|e| DuError::from_io(path, e))
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<Result<DirEntryMeta>>> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for item in walker {
            match item {
                Ok(entry) => {
                    let meta = entry
                        .metadata()
                        .map(|md| EntryMeta::from_metadata(&md))
                        .map_err(|e| walk_error(entry.path(), e));

                    entries.push(meta.map(|meta| DirEntryMeta {
                        name: entry.file_name().to_os_string(),
                        meta,
                    }));
                }
                // Depth 0 is the directory itself: nothing could be listed.
                Err(err) if err.depth() == 0 => return Err(walk_error(path, err)),
                Err(err) => entries.push(Err(walk_error(path, err))),
            }
        }

        Ok(entries)
    }

    #[cfg(unix)]
    #[allow(clippy::useless_conversion)]
    fn block_size(&self, path: &Path) -> Result<u64> {
        let probe_failed = |reason: String| DuError::BlockSizeProbeFailed {
            path: path.to_path_buf(),
            reason,
        };

        let stat = nix::sys::statfs::statfs(path).map_err(|errno| probe_failed(errno.to_string()))?;

        // The field width differs between platforms.
        u64::try_from(stat.block_size()).map_err(|e| probe_failed(e.to_string()))
    }

    #[cfg(not(unix))]
    fn block_size(&self, path: &Path) -> Result<u64> {
        Err(DuError::BlockSizeProbeFailed {
            path: path.to_path_buf(),
            reason: "not supported on this platform".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("data.bin");
        fs::write(&file, vec![0u8; 3456]).unwrap();

        let fs_impl = OsFileSystem::new();

        let meta = fs_impl.inspect(&file, false).unwrap();
        assert_eq!(meta.kind, EntryKind::File);
        assert_eq!(meta.len, 3456);

        let meta = fs_impl.inspect(temp_dir.path(), false).unwrap();
        assert!(meta.is_dir());
    }

    #[test]
    fn test_inspect_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("ak5i8fg74");

        let err = OsFileSystem::new().inspect(&missing, true).unwrap_err();
        assert!(matches!(err, DuError::NotFound { .. }));
    }

    #[test]
    fn test_list_entries_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(temp_dir.path().join("beta")).unwrap();

        let entries = OsFileSystem::new().list_entries(temp_dir.path()).unwrap();
        let names: Vec<_> = entries
            .into_iter()
            .map(|e| e.unwrap().name.to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["alpha", "beta", "mid", "zeta"]);
    }

    #[test]
    fn test_list_entries_does_not_descend() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a").join("b")).unwrap();
        fs::write(temp_dir.path().join("a").join("b").join("deep"), b"x").unwrap();

        let entries = OsFileSystem::new().list_entries(temp_dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].as_ref().unwrap().meta.is_dir());
    }

    #[test]
    fn test_list_entries_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = OsFileSystem::new().list_entries(&temp_dir.path().join("nope"));
        assert!(matches!(result, Err(DuError::NotFound { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_not_followed_unless_asked() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs_impl = OsFileSystem::new();
        assert!(fs_impl.inspect(&link, false).unwrap().is_symlink());
        assert!(fs_impl.inspect(&link, true).unwrap().is_dir());
    }

    #[test]
    #[cfg(unix)]
    fn test_block_size_probe() {
        let temp_dir = TempDir::new().unwrap();
        let block_size = OsFileSystem::new().block_size(temp_dir.path()).unwrap();
        assert!(block_size > 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_metadata_carries_file_id() {
        let temp_dir = TempDir::new().unwrap();
        let meta = OsFileSystem::new().inspect(temp_dir.path(), false).unwrap();
        assert!(meta.file_id().is_some());
    }
}
