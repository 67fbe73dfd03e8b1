//! Error types for transcription
//!
//! Unsupported input is rejected by extension before any file is read;
//! everything after that is either I/O or a structural problem in the
//! source document.

use maestro_model::DefinitionError;
use std::path::{Path, PathBuf};

/// Errors turning an external document into a stored definition
#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    /// No transcriber registered for the file extension
    #[error("unsupported input {path}: expected one of {supported}")]
    UnsupportedExtension { path: PathBuf, supported: String },

    /// IO error reading the source or writing the definition
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source document does not have the expected shape
    #[error("structural error in {path}: {description}")]
    Structural { path: PathBuf, description: String },

    /// Recovered definition does not form a valid procedure
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

impl TranscribeError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create structural error for path
    pub fn structural(path: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self::Structural {
            path: path.into(),
            description: description.into(),
        }
    }

    /// Source file the error refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::UnsupportedExtension { path, .. }
            | Self::Io { path, .. }
            | Self::Structural { path, .. } => path,
            Self::Definition(err) => err.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_names_file() {
        let err = TranscribeError::structural("in/egress.html", "step outside a column");
        assert_eq!(
            err.to_string(),
            "structural error in in/egress.html: step outside a column"
        );
        assert_eq!(err.path(), Path::new("in/egress.html"));
    }
}
