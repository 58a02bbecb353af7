use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::{ArchiveSerializer, TarSerializer};
use crate::error::{Error, IoResultExt, Result};
use crate::fs::{
    naming_base, unix_relative_path, Enumerator, FileType, SourceEntry, WalkdirEnumerator,
};
use crate::hash::Hash;
use crate::layer::blob::LayerBlob;
use crate::layer::entry::{normalize, normalize_extraction_path, ArchiveEntry};

/// files registered together for one extraction path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    source_files: Vec<PathBuf>,
    /// absolute, without a trailing slash (empty for `/`)
    extraction_path: String,
}

impl SourceGroup {
    pub fn new(source_files: Vec<PathBuf>, extraction_path: &str) -> Result<Self> {
        Ok(Self {
            source_files,
            extraction_path: normalize_extraction_path(extraction_path)?,
        })
    }

    pub fn source_files(&self) -> &[PathBuf] {
        &self.source_files
    }

    pub fn extraction_path(&self) -> &str {
        &self.extraction_path
    }

    /// expand this group into normalized entries, in enumeration order
    fn expand(&self, enumerator: &dyn Enumerator, out: &mut Vec<ArchiveEntry>) -> Result<()> {
        for source in &self.source_files {
            // follows symlinks, so a link to a directory is expanded as one.
            // stat failures fall through to the lstat below, which reports them
            let is_dir = fs::metadata(source).map(|m| m.is_dir()).unwrap_or(false);

            if is_dir {
                let base = naming_base(source)?;
                let before = out.len();
                for entry in enumerator.walk(source) {
                    let entry = entry?;
                    let relative = unix_relative_path(&base, &entry.path)?;
                    let name = format!("{}/{}", self.extraction_path, relative);
                    out.push(normalize(&entry, name)?);
                }
                debug!(
                    source = %source.display(),
                    extraction_path = %self.extraction_path,
                    entries = out.len() - before,
                    "expanded directory"
                );
            } else {
                let file_name = source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        Error::InvalidPath(format!(
                            "{} has no usable file name",
                            source.display()
                        ))
                    })?;
                let entry = SourceEntry::from_path(source)?;
                let name = format!("{}/{}", self.extraction_path, file_name);
                out.push(normalize(&entry, name)?);
            }
        }
        Ok(())
    }
}

/// builds reproducible layer tars from registered files and directories
///
/// entries are sorted by name and stripped of timestamps and ownership, so the
/// output depends only on file names, contents, types and permission bits.
///
/// directories registered as sources contribute their contents, nested under
/// the directory's own name, but not a record for the directory itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerBuilder {
    groups: Vec<SourceGroup>,
}

impl LayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// add `source_files` to be extracted at `extraction_path`
    ///
    /// no filesystem access happens until the layer is built.
    pub fn register<I, P>(mut self, source_files: I, extraction_path: &str) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let files = source_files.into_iter().map(Into::into).collect();
        self.groups.push(SourceGroup::new(files, extraction_path)?);
        Ok(self)
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    /// every registered source path, in registration order
    pub fn source_files(&self) -> Vec<PathBuf> {
        self.groups
            .iter()
            .flat_map(|g| g.source_files.iter().cloned())
            .collect()
    }

    /// the entries in the order the serializer receives them
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        self.entries_with(&WalkdirEnumerator)
    }

    pub fn entries_with(&self, enumerator: &dyn Enumerator) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();
        for group in &self.groups {
            group.expand(enumerator, &mut entries)?;
        }
        sort_entries(&mut entries);
        dedup_entries(entries)
    }

    /// build the layer with the default enumerator and a GNU tar serializer
    pub fn build(&self) -> Result<LayerBlob> {
        self.build_with(&WalkdirEnumerator, TarSerializer::in_memory())
    }

    pub fn build_with<S>(&self, enumerator: &dyn Enumerator, mut serializer: S) -> Result<LayerBlob>
    where
        S: ArchiveSerializer<Output = Vec<u8>>,
    {
        let entries = self.entries_with(enumerator)?;
        for entry in &entries {
            serializer.add_entry(entry)?;
        }
        let blob = LayerBlob::new(serializer.finish()?);

        info!(
            groups = self.groups.len(),
            entries = entries.len(),
            bytes = blob.len(),
            "built layer"
        );
        Ok(blob)
    }
}

/// order by name bytes
///
/// the sort is stable. records sharing a name are either equivalent, and so
/// serialize identically whichever is kept, or rejected by the dedup pass.
pub fn sort_entries(entries: &mut [ArchiveEntry]) {
    entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
}

/// collapse same-name records in a sorted list
///
/// records collapse only when they would produce the same archive member;
/// any other same-name pair is ambiguous.
fn dedup_entries(entries: Vec<ArchiveEntry>) -> Result<Vec<ArchiveEntry>> {
    let mut out: Vec<ArchiveEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(prev) = out.last() {
            if prev.name == entry.name {
                if !equivalent(prev, &entry)? {
                    return Err(Error::DuplicateEntry(entry.name));
                }
                debug!(name = %entry.name, source = %entry.source.display(), "skipping duplicate entry");
                continue;
            }
        }
        out.push(entry);
    }
    Ok(out)
}

/// same type, permission bits, size, link target and content
fn equivalent(a: &ArchiveEntry, b: &ArchiveEntry) -> Result<bool> {
    if a.file_type != b.file_type
        || a.mode != b.mode
        || a.size != b.size
        || a.link_target != b.link_target
    {
        return Ok(false);
    }
    if a.file_type != FileType::Regular || a.source == b.source {
        return Ok(true);
    }
    Ok(content_hash(&a.source)? == content_hash(&b.source)?)
}

fn content_hash(path: &Path) -> Result<Hash> {
    let file = fs::File::open(path).enumerating(path)?;
    Hash::of_reader(file).enumerating(path)
}
