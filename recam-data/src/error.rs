//! Error types shared by the resamplers.

use std::path::PathBuf;
use thiserror::Error;

/// Failure category of a resampling invocation.
///
/// Callers (and tests) branch on this rather than on the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid argument, e.g. a target frame count below 1.
    Value,
    /// Camera document is empty or its records are unusable.
    MalformedInput,
    /// Video container is unreadable or yields no frames.
    Decode,
    /// Source or destination path is inaccessible.
    Io,
}

impl ErrorKind {
    /// Process exit code used by the command line tools. Code 2 is left to
    /// argument parsing errors.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Io => 6,
            ErrorKind::MalformedInput => 3,
            ErrorKind::Value => 4,
            ErrorKind::Decode => 5,
        }
    }
}

/// Errors raised by the camera side and by the shared index mapping.
#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("Invalid target frame count {0}: must be at least 1")]
    InvalidTarget(i64),

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Malformed camera input: {0}")]
    MalformedInput(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResampleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResampleError::InvalidTarget(_) | ResampleError::InvalidResolution(_) => {
                ErrorKind::Value
            }
            ResampleError::MalformedInput(_) => ErrorKind::MalformedInput,
            ResampleError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ResampleError::MalformedInput(reason.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResampleError::Io {
            path: path.into(),
            source,
        }
    }
}
