//! Error types for the procedure model
//!
//! - Structural edits (move/insert/delete) fail with [`EditError`] and leave
//!   the model untouched.
//! - Loading and saving stored definitions fail with [`DefinitionError`],
//!   which always names the file involved.

use std::path::PathBuf;

/// Rejected structural edit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Index outside the current sequence
    #[error("{operation}: {entity} index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        operation: &'static str,
        entity: &'static str,
        index: usize,
        len: usize,
    },

    /// A task must keep at least one division
    #[error("cannot delete the only division of task '{task}'")]
    LastDivision { task: String },

    /// Id not present in the current order
    #[error("unknown {entity} id {id}")]
    UnknownId { entity: &'static str, id: String },

    /// Task definition rejected while inserting
    #[error("invalid task: {0}")]
    InvalidTask(String),
}

impl EditError {
    /// Create out-of-bounds error
    pub fn out_of_bounds(
        operation: &'static str,
        entity: &'static str,
        index: usize,
        len: usize,
    ) -> Self {
        Self::IndexOutOfBounds {
            operation,
            entity,
            index,
            len,
        }
    }

    /// Create unknown-id error
    pub fn unknown_id(entity: &'static str, id: impl ToString) -> Self {
        Self::UnknownId {
            entity,
            id: id.to_string(),
        }
    }
}

/// Errors loading or saving a stored procedure definition
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// IO error on a definition file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or inconsistent definition
    #[error("structural error in {path}: {description}")]
    Structural { path: PathBuf, description: String },

    /// Definition could not be serialized
    #[error("cannot serialize definition for {path}: {message}")]
    Serialize { path: PathBuf, message: String },
}

impl DefinitionError {
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

    /// File the error originates from
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Structural { path, .. } | Self::Serialize { path, .. } => {
                path
            }
        }
    }
}
