use std::path::PathBuf;

/// error type for layer building
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("failed to enumerate {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ambiguous layer: conflicting entries for {0}")]
    DuplicateEntry(String),

    #[error("cannot serialize entry {name}: {message}")]
    Serialization { name: String, message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn serialization(name: impl Into<String>, message: impl ToString) -> Self {
        Error::Serialization {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;

    /// same as `with_path`, but classified as a traversal failure
    fn enumerating(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }

    fn enumerating(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Enumeration {
            path: path.into(),
            source,
        })
    }
}
