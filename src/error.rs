//! Crate-level error type.
//!
//! The parsers layer has its own [`ParseError`]/[`ExportError`] pair; this
//! wrapper is what library entry points and the CLI surface to callers, with
//! path context attached to IO failures.

use crate::parsers::{ExportError, ParseError};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for sbom-graph operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to parse document: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to export document: {0}")]
    Export(#[from] ExportError),

    #[error("IO error at {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}

impl Error {
    /// Attach path context to an IO failure.
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

/// Convenient Result type for sbom-graph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_carries_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io("/tmp/bom.json", &source);
        assert!(err.to_string().contains("bom.json"));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn parse_error_converts() {
        let err: Error = ParseError::UnknownFormat("?".to_string()).into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
