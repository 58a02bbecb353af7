//! reprolayer - reproducible container image layers
//!
//! builds layer tars whose bytes depend only on the logical content of the
//! sources: file names, contents, types and permission bits. build time,
//! file ownership, timestamps and directory enumeration order do not leak
//! into the archive, so the layer digest is stable across machines.
//!
//! # Pipeline
//!
//! - **register**: source files and directories are grouped under an
//!   extraction path inside the image
//! - **expand**: directories are walked; their contents keep the directory's
//!   own name as the first path component
//! - **normalize**: mtime, uid, gid and owner names are forced to zero/empty
//! - **sort**: entries are ordered by name, byte-wise
//! - **serialize**: entries are written in that order as a GNU tar
//!
//! # Example usage
//!
//! ```no_run
//! use reprolayer::LayerBuilder;
//!
//! let layer = LayerBuilder::new()
//!     .register(["target/app.jar"], "/app")?
//!     .register(["target/lib"], "/app/lib")?
//!     .build()?;
//!
//! println!("diff id {}", layer.digest());
//! # Ok::<(), reprolayer::Error>(())
//! ```

mod config;
mod error;
mod hash;

pub mod archive;
pub mod fs;
pub mod layer;

pub use archive::{ArchiveSerializer, TarSerializer};
pub use config::{Compression, EntryConfig, LayerConfig, DEFAULT_ZSTD_LEVEL};
pub use error::{Error, Result};
pub use fs::{Enumerator, FileType, SourceEntry, WalkdirEnumerator};
pub use hash::{Hash, HashingWriter};
pub use layer::{ArchiveEntry, LayerBlob, LayerBuilder, SourceGroup, WrittenLayer};
