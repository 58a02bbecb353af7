use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::fs::{FileType, SourceEntry};

/// permission bits carried into the archive (rwx, setuid/setgid, sticky)
pub const PERMISSION_MASK: u32 = 0o7777;

/// a normalized archive record
///
/// constructed only through [`normalize`], so the ownership and timestamp
/// fields always hold the fixed values below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// absolute unix-style path inside the layer
    pub name: String,
    pub file_type: FileType,
    pub size: u64,
    pub mode: u32,
    /// host path the content is read from
    pub source: PathBuf,
    pub link_target: Option<PathBuf>,
    pub mtime: u64,
    pub uid: u64,
    pub gid: u64,
    pub username: String,
    pub groupname: String,
}

impl ArchiveEntry {
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// build the normalized record for `entry` stored at `name`
///
/// content, size, type and permission bits pass through; modification time,
/// owner ids and owner names are replaced with constants.
pub fn normalize(entry: &SourceEntry, name: String) -> Result<ArchiveEntry> {
    validate_archive_path(&name)?;

    Ok(ArchiveEntry {
        name,
        file_type: entry.file_type,
        size: entry.size,
        mode: entry.mode & PERMISSION_MASK,
        source: entry.path.clone(),
        link_target: entry.symlink_target.clone(),
        mtime: 0,
        uid: 0,
        gid: 0,
        username: String::new(),
        groupname: String::new(),
    })
}

/// validate a full entry name: absolute, no empty/`.`/`..` segments, no NUL
pub fn validate_archive_path(name: &str) -> Result<()> {
    let rest = name
        .strip_prefix('/')
        .ok_or_else(|| Error::InvalidPath(format!("entry name is not absolute: {}", name)))?;
    if rest.is_empty() {
        return Err(Error::InvalidPath("entry name is the root".to_string()));
    }
    if name.contains('\0') {
        return Err(Error::InvalidPath(format!(
            "entry name contains null byte: {}",
            name.escape_debug()
        )));
    }
    for segment in rest.split('/') {
        match segment {
            "" => {
                return Err(Error::InvalidPath(format!(
                    "entry name has an empty segment: {}",
                    name
                )))
            }
            "." | ".." => {
                return Err(Error::InvalidPath(format!(
                    "entry name has a relative segment: {}",
                    name
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

/// validate and canonicalize an extraction path
///
/// trailing slashes are dropped, so `/` becomes the empty prefix and its
/// entries land at `/<name>`.
pub fn normalize_extraction_path(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(Error::InvalidPath("empty extraction path".to_string()));
    }
    if !path.starts_with('/') {
        return Err(Error::InvalidPath(format!(
            "extraction path is not absolute: {}",
            path
        )));
    }
    if path.contains('\0') {
        return Err(Error::InvalidPath(format!(
            "extraction path contains null byte: {}",
            path.escape_debug()
        )));
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed
        .split('/')
        .skip(1)
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(Error::InvalidPath(format!(
            "extraction path has an empty or relative segment: {}",
            path
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(file_type: FileType) -> SourceEntry {
        SourceEntry {
            path: PathBuf::from("/host/src/file"),
            file_type,
            uid: 1000,
            gid: 1000,
            mode: 0o100755,
            size: 42,
            mtime: 1_700_000_000,
            symlink_target: None,
        }
    }

    #[test]
    fn test_normalize_strips_metadata() {
        let entry = normalize(&raw(FileType::Regular), "/app/file".to_string()).unwrap();
        assert_eq!(entry.mtime, 0);
        assert_eq!(entry.uid, 0);
        assert_eq!(entry.gid, 0);
        assert_eq!(entry.username, "");
        assert_eq!(entry.groupname, "");
    }

    #[test]
    fn test_normalize_passes_content_through() {
        let entry = normalize(&raw(FileType::Regular), "/app/file".to_string()).unwrap();
        assert_eq!(entry.name, "/app/file");
        assert_eq!(entry.file_type, FileType::Regular);
        assert_eq!(entry.size, 42);
        assert_eq!(entry.mode, 0o755);
        assert_eq!(entry.source, PathBuf::from("/host/src/file"));
    }

    #[test]
    fn test_normalize_keeps_link_target() {
        let mut link = raw(FileType::Symlink);
        link.symlink_target = Some(PathBuf::from("../lib/real.so"));
        let entry = normalize(&link, "/app/link.so".to_string()).unwrap();
        assert_eq!(entry.link_target, Some(PathBuf::from("../lib/real.so")));
    }

    #[test]
    fn test_normalize_rejects_bad_names() {
        let source = raw(FileType::Regular);
        for name in ["app/file", "/", "/app/../etc/passwd", "/app//file", "/app/./f", "/a\0b"] {
            let err = normalize(&source, name.to_string()).unwrap_err();
            assert!(matches!(err, Error::InvalidPath(_)), "{:?} accepted", name);
        }
    }

    #[test]
    fn test_extraction_path_trailing_slash() {
        assert_eq!(normalize_extraction_path("/app/").unwrap(), "/app");
        assert_eq!(normalize_extraction_path("/app").unwrap(), "/app");
        assert_eq!(normalize_extraction_path("/").unwrap(), "");
    }

    #[test]
    fn test_extraction_path_rejected() {
        for path in ["", "app", "/app/../x", "/a//b", "/a\0"] {
            assert!(
                normalize_extraction_path(path).is_err(),
                "{:?} accepted",
                path
            );
        }
    }
}
