use std::path::{Path, PathBuf};
use thiserror::Error;

/// Problems with the settings read at startup. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Problems listing the input directory. Always fatal.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("Input directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read input directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{} and {} would both be uploaded as {key}", .first.display(), .second.display())]
    DuplicateKey {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Tinify rejected the image ({status}): {error}: {message}")]
    Rejected {
        status: u16,
        error: String,
        message: String,
    },

    #[error("Tinify request failed: {0}")]
    Transport(String),

    #[error("Unexpected Tinify response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Storage returned status {status} for {key}")]
    Status { status: u16, key: String },

    #[error("Storage request failed: {0}")]
    Transport(String),
}

/// Why a single file did not make it to the bucket.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compress {path}: {source}")]
    Compression {
        path: PathBuf,
        #[source]
        source: CompressionError,
    },

    #[error("Failed to upload {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: UploadError,
    },
}

impl TaskError {
    pub fn path(&self) -> &Path {
        match self {
            TaskError::Read { path, .. }
            | TaskError::Compression { path, .. }
            | TaskError::Upload { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error("Failed to set up Tinify client: {0}")]
    CompressionClient(String),

    #[error("Failed to set up storage client: {0}")]
    StorageClient(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
