use std::fs::File;
use std::io::{self, Read, Take, Write};

use tar::{Builder, EntryType, Header};

use crate::archive::ArchiveSerializer;
use crate::error::{Error, IoResultExt, Result};
use crate::fs::FileType;
use crate::layer::ArchiveEntry;

/// GNU tar serializer
///
/// names are written relative to the layer root (leading `/` stripped),
/// directories with a trailing `/`. long names use GNU long-name records.
pub struct TarSerializer<W: Write> {
    builder: Builder<W>,
}

impl TarSerializer<Vec<u8>> {
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }
}

impl<W: Write> TarSerializer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            builder: Builder::new(writer),
        }
    }

    fn header_for(entry: &ArchiveEntry, entry_type: EntryType, size: u64) -> Result<Header> {
        let mut header = Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_size(size);
        header.set_mode(entry.mode);
        header.set_mtime(entry.mtime);
        header.set_uid(entry.uid);
        header.set_gid(entry.gid);
        header
            .set_username(&entry.username)
            .map_err(|e| Error::serialization(&entry.name, e))?;
        header
            .set_groupname(&entry.groupname)
            .map_err(|e| Error::serialization(&entry.name, e))?;
        Ok(header)
    }
}

/// name as stored in the tar stream
fn stored_name(entry: &ArchiveEntry) -> String {
    let relative = entry.name.trim_start_matches('/');
    if entry.is_dir() {
        format!("{}/", relative)
    } else {
        relative.to_string()
    }
}

/// reader that yields exactly `len` bytes of `inner`
///
/// bytes past `len` are never read, and running out early is an
/// `UnexpectedEof` error, so the payload always matches the header size.
struct ExactLength<R> {
    inner: Take<R>,
    remaining: u64,
}

impl<R: Read> ExactLength<R> {
    fn new(inner: R, len: u64) -> Self {
        Self {
            inner: inner.take(len),
            remaining: len,
        }
    }
}

impl<R: Read> Read for ExactLength<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("source ended {} bytes early", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl<W: Write> ArchiveSerializer for TarSerializer<W> {
    type Output = W;

    fn add_entry(&mut self, entry: &ArchiveEntry) -> Result<()> {
        let path = stored_name(entry);

        match entry.file_type {
            FileType::Regular => {
                let file = File::open(&entry.source).enumerating(&entry.source)?;
                let current = file.metadata().enumerating(&entry.source)?.len();
                if current != entry.size {
                    return Err(Error::serialization(
                        &entry.name,
                        format!(
                            "{} changed size since enumeration ({} -> {} bytes)",
                            entry.source.display(),
                            entry.size,
                            current
                        ),
                    ));
                }
                let mut header = Self::header_for(entry, EntryType::Regular, entry.size)?;
                self.builder
                    .append_data(&mut header, &path, ExactLength::new(file, entry.size))
                    .map_err(|e| Error::serialization(&entry.name, e))
            }
            FileType::Directory => {
                let mut header = Self::header_for(entry, EntryType::Directory, 0)?;
                self.builder
                    .append_data(&mut header, &path, std::io::empty())
                    .map_err(|e| Error::serialization(&entry.name, e))
            }
            FileType::Symlink => {
                let target = entry.link_target.as_ref().ok_or_else(|| {
                    Error::serialization(&entry.name, "symlink without a target")
                })?;
                let mut header = Self::header_for(entry, EntryType::Symlink, 0)?;
                self.builder
                    .append_link(&mut header, &path, target)
                    .map_err(|e| Error::serialization(&entry.name, e))
            }
            other => Err(Error::serialization(
                &entry.name,
                format!("unsupported entry type: {}", other.type_name()),
            )),
        }
    }

    fn finish(self) -> Result<W> {
        self.builder
            .into_inner()
            .map_err(|e| Error::serialization("<end of archive>", e))
    }
}
