//! archive serialization for normalized entries

mod tarball;

pub use tarball::TarSerializer;

use crate::error::Result;
use crate::layer::ArchiveEntry;

/// turns an ordered sequence of normalized entries into an archive
///
/// entries must appear in the output in the order they were added.
pub trait ArchiveSerializer {
    type Output;

    fn add_entry(&mut self, entry: &ArchiveEntry) -> Result<()>;

    fn finish(self) -> Result<Self::Output>;
}
