use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::fs::SourceEntry;

/// lazy sequence of the entries below a directory
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<SourceEntry>> + 'a>;

/// produces every descendant of a directory
///
/// implementations must be exhaustive and finite, must not yield `root`
/// itself, and may yield entries in any order. calling `walk` again on the
/// same root restarts the traversal.
pub trait Enumerator {
    fn walk<'a>(&'a self, root: &Path) -> EntryIter<'a>;
}

/// depth-first enumerator backed by walkdir
///
/// symlinks below the root are reported as symlinks, not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirEnumerator;

impl Enumerator for WalkdirEnumerator {
    fn walk<'a>(&'a self, root: &Path) -> EntryIter<'a> {
        let base = root.to_path_buf();
        let iter = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .map(move |entry| {
                let entry = entry.map_err(|e| walk_error(&base, e))?;
                let meta = entry
                    .metadata()
                    .map_err(|e| walk_error(entry.path(), e))?;
                SourceEntry::from_std_metadata(entry.path(), &meta)
            });
        Box::new(iter)
    }
}

fn walk_error(fallback: &Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    Error::Enumeration {
        path,
        source: io::Error::from(err),
    }
}

/// relative path of `path` below `base`, as forward-slash separated components
///
/// fails if `path` is not below `base` or a component is not valid UTF-8.
pub fn unix_relative_path(base: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(base).map_err(|_| {
        Error::InvalidPath(format!(
            "{} is not below {}",
            path.display(),
            base.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        if component == Component::CurDir {
            continue;
        }
        let part = component.as_os_str().to_str().ok_or_else(|| {
            Error::InvalidPath(format!("non UTF-8 path component in {}", path.display()))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

/// parent of a registered directory, used as the base for naming its entries
pub fn naming_base(dir: &Path) -> Result<PathBuf> {
    dir.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::InvalidPath(format!("{} has no parent directory", dir.display())))
}
