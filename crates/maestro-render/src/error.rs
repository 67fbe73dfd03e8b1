//! Error types for procedure writers

use std::fmt::Display;
use std::path::PathBuf;

/// Errors producing one output format
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Procedure lacks a field this format needs
    #[error("{format}: procedure '{procedure}' has no '{field}' field")]
    MissingField {
        format: &'static str,
        field: &'static str,
        procedure: String,
    },

    /// Field value can't be used where this format needs it
    #[error("{format}: procedure '{procedure}' has invalid '{field}' value '{value}'")]
    InvalidField {
        format: &'static str,
        field: &'static str,
        value: String,
        procedure: String,
    },

    /// Writing the output (or reading an asset) failed
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Markup or front matter could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// DOCX packaging failed
    #[error("archive error: {0}")]
    Archive(String),

    /// Writer used out of order
    #[error("{format}: {message}")]
    Sequence {
        format: &'static str,
        message: &'static str,
    },
}

impl RenderError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(error: impl Display) -> Self {
        Self::Serialization(error.to_string())
    }

    pub(crate) fn archive(error: impl Display) -> Self {
        Self::Archive(error.to_string())
    }

    /// Whether remaining formats for the same procedure should be abandoned
    ///
    /// Only I/O failures are; a missing field or a serialization problem is
    /// confined to its format.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_procedure() {
        let err = RenderError::MissingField {
            format: "ipv-xml",
            field: "document_id",
            procedure: "Airlock Egress".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ipv-xml: procedure 'Airlock Egress' has no 'document_id' field"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn io_is_fatal() {
        let err = RenderError::io_error(
            "/out/x.docx",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_fatal());
    }
}
