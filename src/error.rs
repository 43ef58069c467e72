//! Error types for the reconstruction chain
//!
//! Events rejected on kinematic grounds are *not* errors: they are counted in
//! the statistics returned by each stage (see `Rejection` in the cone
//! builders). Errors abort the stage that raised them. Nothing is retried.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Nothing to work on
    #[error("empty input: no {stage} available")]
    EmptyInput { stage: &'static str },

    /// Required input file absent or unreadable
    #[error("missing resource `{}`: {source}", path.display())]
    MissingResource { path: PathBuf, source: io::Error },

    /// Pixel or voxel geometry inconsistent with the configuration
    #[error("geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// Cones from the local sensor frame and the global frame cannot share a volume
    #[error("cones mix sensor-local and global coordinate frames")]
    MixedFrames,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        Self::GeometryMismatch(message.into())
    }

    /// Wrap an I/O failure on `path`, distinguishing absent files
    pub(crate) fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied =>
                Self::MissingResource { path: path.into(), source },
            _ => Self::Io(source),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self { Self::Config(e.to_string()) }
}
