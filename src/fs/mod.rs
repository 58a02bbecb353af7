pub mod read;
pub mod walk;

pub use read::{FileType, SourceEntry};
pub use walk::{naming_base, unix_relative_path, Enumerator, EntryIter, WalkdirEnumerator};
