use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::hash::{Hash, HashingWriter};

/// a serialized, uncompressed layer tar
#[derive(Clone, PartialEq, Eq)]
pub struct LayerBlob {
    bytes: Vec<u8>,
}

/// what was written to disk by [`LayerBlob::write_to`] or
/// [`LayerBlob::write_zstd_to`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrittenLayer {
    /// digest of the bytes on disk (compressed if compression was used)
    pub digest: Hash,
    pub size: u64,
    /// digest of the uncompressed tar
    pub diff_id: Hash,
}

impl LayerBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 of the uncompressed tar (the layer's diff id)
    pub fn digest(&self) -> Hash {
        Hash::of(&self.bytes)
    }

    /// write the tar as-is
    pub fn write_to(&self, path: &Path) -> Result<WrittenLayer> {
        let file = File::create(path).with_path(path)?;
        let mut writer = HashingWriter::new(BufWriter::new(file));
        writer.write_all(&self.bytes).with_path(path)?;
        writer.flush().with_path(path)?;
        let (_, digest, size) = writer.finalize();

        Ok(WrittenLayer {
            digest,
            size,
            diff_id: digest,
        })
    }

    /// write the tar zstd-compressed
    pub fn write_zstd_to(&self, path: &Path, level: i32) -> Result<WrittenLayer> {
        let file = File::create(path).with_path(path)?;
        let hashing = HashingWriter::new(BufWriter::new(file));
        let mut encoder = zstd::Encoder::new(hashing, level).with_path(path)?;
        encoder.write_all(&self.bytes).with_path(path)?;
        let mut hashing = encoder.finish().with_path(path)?;
        hashing.flush().with_path(path)?;
        let (_, digest, size) = hashing.finalize();

        Ok(WrittenLayer {
            digest,
            size,
            diff_id: self.digest(),
        })
    }

    /// zstd-compressed copy of the tar
    pub fn compress_zstd(&self, level: i32) -> Result<Vec<u8>> {
        zstd::encode_all(self.bytes.as_slice(), level).with_path("<layer>")
    }
}

impl std::fmt::Debug for LayerBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerBlob")
            .field("len", &self.bytes.len())
            .field("digest", &self.digest())
            .finish()
    }
}
