use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Dependency resolver unavailable: {0}")]
    ResolverUnavailable(String),
}

impl ScanError {
    /// Classify an I/O error raised while touching `path`
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }

    /// Benign errors are dropped without a diagnostic message
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure to extract dependencies from a single candidate file
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Scripts, static binaries, data files named like libraries
    #[error("not a dynamic executable: {0}")]
    NotDynamic(PathBuf),

    #[error("{}: {message}", path.display())]
    Failed { path: PathBuf, message: String },

    #[error("failed to run resolver for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Whether the failure simply means "nothing to resolve here"
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotDynamic(_))
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
