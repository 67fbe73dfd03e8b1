//! Error taxonomy surfaced to callers of the Maestro tooling
//!
//! Lower crates report their own errors (`DefinitionError`, `RenderError`,
//! `TranscribeError`, `EditError`); they convert into [`MaestroError`] at
//! this boundary so every failure names the path, file or index involved.

use maestro_model::{DefinitionError, EditError};
use maestro_render::RenderError;
use maestro_transcribe::TranscribeError;
use std::path::{Path, PathBuf};

/// Result type for Maestro operations
pub type Result<T> = std::result::Result<T, MaestroError>;

/// Top-level Maestro error
#[derive(Debug, thiserror::Error)]
pub enum MaestroError {
    /// A required directory is absent
    #[error("{expected} directory not found: {path}")]
    PathNotFound {
        path: PathBuf,
        expected: &'static str,
    },

    /// A destination is not writable
    #[error("permission denied: {path} is not writable")]
    PermissionDenied { path: PathBuf },

    /// Input extension has no transcriber
    #[error("unsupported input format {path}: expected one of {supported}")]
    UnsupportedFormat { path: PathBuf, supported: String },

    /// A required input file was not given
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Stored definition or transcription source is malformed
    #[error("structural error in {file}: {description}")]
    StructuralParse { file: PathBuf, description: String },

    /// Structural edit rejected; nothing was changed
    #[error("invalid edit operation: {0}")]
    InvalidEditOperation(#[from] EditError),

    /// Writer failure for one format
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Any other I/O failure
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MaestroError {
    /// Classify an I/O failure on `path`
    ///
    /// Permission problems become [`MaestroError::PermissionDenied`].
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Create structural error for file
    pub fn structural(file: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self::StructuralParse {
            file: file.into(),
            description: description.into(),
        }
    }

    /// Create path-not-found error
    pub fn path_not_found(path: impl Into<PathBuf>, expected: &'static str) -> Self {
        Self::PathNotFound {
            path: path.into(),
            expected,
        }
    }

    /// Whether the whole invocation must stop
    ///
    /// Missing directories, unwritable destinations and writer I/O are
    /// fatal. A malformed file or a rejected edit only affects itself.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::PathNotFound { .. } | Self::PermissionDenied { .. } | Self::MissingInput(_) => true,
            Self::Render(err) => err.is_fatal(),
            Self::Io { .. } => true,
            Self::UnsupportedFormat { .. }
            | Self::StructuralParse { .. }
            | Self::InvalidEditOperation(_) => false,
        }
    }

    /// Whether a batch over many files must stop, not just the current file
    ///
    /// Missing directories and permission problems are not specific to
    /// one definition.
    #[must_use]
    pub fn stops_batch(&self) -> bool {
        match self {
            Self::PathNotFound { .. } | Self::PermissionDenied { .. } | Self::MissingInput(_) => true,
            Self::Render(RenderError::Io { source, .. }) => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }

    /// File the error refers to, when there is one
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathNotFound { path, .. }
            | Self::PermissionDenied { path }
            | Self::UnsupportedFormat { path, .. }
            | Self::Io { path, .. } => Some(path),
            Self::StructuralParse { file, .. } => Some(file),
            Self::Render(RenderError::Io { path, .. }) => Some(path),
            Self::MissingInput(_) | Self::InvalidEditOperation(_) | Self::Render(_) => None,
        }
    }
}

impl From<DefinitionError> for MaestroError {
    fn from(err: DefinitionError) -> Self {
        match err {
            DefinitionError::Io { path, source } => Self::io_error(path, source),
            DefinitionError::Structural { path, description } => Self::structural(path, description),
            DefinitionError::Serialize { path, message } => {
                Self::structural(path, format!("cannot serialize: {message}"))
            }
        }
    }
}

impl From<TranscribeError> for MaestroError {
    fn from(err: TranscribeError) -> Self {
        match err {
            TranscribeError::UnsupportedExtension { path, supported } => {
                Self::UnsupportedFormat { path, supported }
            }
            TranscribeError::Io { path, source } => Self::io_error(path, source),
            TranscribeError::Structural { path, description } => Self::structural(path, description),
            TranscribeError::Definition(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn permission_denied_is_classified() {
        let err = MaestroError::io_error("build", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, MaestroError::PermissionDenied { .. }));
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "permission denied: build is not writable");
    }

    #[test]
    fn structural_definition_error_keeps_file() {
        let err: MaestroError = DefinitionError::structural("procedures/bad.yml", "no tasks").into();
        assert!(!err.is_fatal());
        assert_eq!(err.path(), Some(Path::new("procedures/bad.yml")));
        assert_eq!(err.to_string(), "structural error in procedures/bad.yml: no tasks");
    }

    #[test]
    fn transcribe_errors_map_onto_taxonomy() {
        let unsupported: MaestroError = TranscribeError::UnsupportedExtension {
            path: "in.pdf".into(),
            supported: ".html, .md".to_string(),
        }
        .into();
        assert!(matches!(unsupported, MaestroError::UnsupportedFormat { .. }));

        let nested: MaestroError =
            TranscribeError::Definition(DefinitionError::structural("in.xml", "bad column")).into();
        assert!(matches!(nested, MaestroError::StructuralParse { .. }));
    }

    #[test]
    fn render_fatality_follows_render_error() {
        let missing: MaestroError = RenderError::MissingField {
            format: "ipv-xml",
            field: "document_id",
            procedure: "P".to_string(),
        }
        .into();
        assert!(!missing.is_fatal());

        let io: MaestroError =
            RenderError::io_error("build/p.docx", io::Error::from(io::ErrorKind::Other)).into();
        assert!(io.is_fatal());
        assert_eq!(io.path(), Some(Path::new("build/p.docx")));
    }

    #[test]
    fn only_shared_failures_stop_a_batch() {
        let denied: MaestroError =
            RenderError::io_error("build", io::Error::from(io::ErrorKind::PermissionDenied)).into();
        assert!(denied.stops_batch());
        assert!(MaestroError::io_error("build/p.md", io::Error::from(io::ErrorKind::PermissionDenied)).stops_batch());
        assert!(MaestroError::path_not_found("procedures", "directory").stops_batch());

        let stylesheet: MaestroError =
            RenderError::io_error("style.css", io::Error::from(io::ErrorKind::NotFound)).into();
        assert!(stylesheet.is_fatal());
        assert!(!stylesheet.stops_batch());
        assert!(!MaestroError::structural("procedures/bad.yml", "no tasks").stops_batch());
    }

    #[test]
    fn edit_errors_are_not_fatal() {
        let err: MaestroError = EditError::out_of_bounds("move_task", "task", 4, 2).into();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("index 4"));
    }
}
