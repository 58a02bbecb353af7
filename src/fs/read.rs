use std::fs::{self, Metadata};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};

/// file type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
}

impl FileType {
    /// detect file type from metadata
    pub fn from_metadata(meta: &Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_file() {
            FileType::Regular
        } else if ft.is_dir() {
            FileType::Directory
        } else if ft.is_symlink() {
            FileType::Symlink
        } else if ft.is_block_device() {
            FileType::BlockDevice
        } else if ft.is_char_device() {
            FileType::CharDevice
        } else if ft.is_fifo() {
            FileType::Fifo
        } else if ft.is_socket() {
            FileType::Socket
        } else {
            // fallback, shouldn't happen
            FileType::Regular
        }
    }

    /// name for listings and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FileType::Regular => "file",
            FileType::Directory => "directory",
            FileType::Symlink => "symlink",
            FileType::BlockDevice => "block device",
            FileType::CharDevice => "char device",
            FileType::Fifo => "fifo",
            FileType::Socket => "socket",
        }
    }
}

/// a filesystem entry as found on the host, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub file_type: FileType,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
    pub size: u64,
    /// modification time, seconds since the epoch
    pub mtime: i64,
    /// link target for symlinks
    pub symlink_target: Option<PathBuf>,
}

impl SourceEntry {
    /// read an entry from path (does not follow symlinks)
    ///
    /// failures are traversal failures: the path vanished or cannot be stat'ed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = fs::symlink_metadata(path).enumerating(path)?;
        Self::from_std_metadata(path, &meta)
    }

    /// create from std::fs::Metadata, reading the link target for symlinks
    pub fn from_std_metadata(path: &Path, meta: &Metadata) -> Result<Self> {
        let file_type = FileType::from_metadata(meta);
        let symlink_target = if file_type == FileType::Symlink {
            Some(fs::read_link(path).enumerating(path)?)
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            file_type,
            uid: meta.uid(),
            gid: meta.gid(),
            mode: meta.mode(),
            size: if file_type == FileType::Regular {
                meta.len()
            } else {
                0
            },
            mtime: meta.mtime(),
            symlink_target,
        })
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use tempfile::tempdir;

    #[test]
    fn test_file_type_regular() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "content").unwrap();

        let entry = SourceEntry::from_path(&path).unwrap();
        assert_eq!(entry.file_type, FileType::Regular);
        assert_eq!(entry.size, 7);
        assert_eq!(entry.symlink_target, None);
    }

    #[test]
    fn test_file_type_directory() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let entry = SourceEntry::from_path(&subdir).unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn test_symlink_not_followed() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::write(&target, "content").unwrap();
        symlink(&target, &link).unwrap();

        let entry = SourceEntry::from_path(&link).unwrap();
        assert_eq!(entry.file_type, FileType::Symlink);
        assert_eq!(entry.symlink_target.as_deref(), Some(target.as_path()));
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn test_dangling_symlink_is_readable() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("link");
        symlink("/does/not/exist", &link).unwrap();

        let entry = SourceEntry::from_path(&link).unwrap();
        assert_eq!(
            entry.symlink_target.as_deref(),
            Some(Path::new("/does/not/exist"))
        );
    }

    #[test]
    fn test_metadata_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "content").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let entry = SourceEntry::from_path(&path).unwrap();
        assert_eq!(entry.mode & 0o777, 0o640);
    }

    #[test]
    fn test_missing_path_is_enumeration_error() {
        let dir = tempdir().unwrap();
        let err = SourceEntry::from_path(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, Error::Enumeration { .. }));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(FileType::Regular.type_name(), "file");
        assert_eq!(FileType::Fifo.type_name(), "fifo");
    }
}
