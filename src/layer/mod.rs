//! layer assembly: expansion, normalization, ordering

mod blob;
mod builder;
mod entry;

pub use blob::{LayerBlob, WrittenLayer};
pub use builder::{sort_entries, LayerBuilder, SourceGroup};
pub use entry::{
    normalize, normalize_extraction_path, validate_archive_path, ArchiveEntry, PERMISSION_MASK,
};
