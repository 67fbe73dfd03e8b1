//! Transcription into a project
//!
//! Checks the project layout, then hands the input to the transcriber
//! registered for its extension. The recovered definition lands in the
//! configured procedures directory.

use crate::error::{MaestroError, Result};
use crate::project::ProjectLayout;
use maestro_transcribe::{default_transcribers, transcribe_file, Transcription};
use std::path::Path;

/// Transcribe `input` into the project's procedures directory
///
/// # Errors
/// - `MissingInput` when no input file is given
/// - `PathNotFound` when the project layout is incomplete
/// - `UnsupportedFormat` for an extension with no transcriber
/// - `StructuralParse` for a malformed source
pub async fn transcribe_input(layout: &ProjectLayout, input: Option<&Path>) -> Result<Transcription> {
    let input = input.ok_or_else(|| {
        MaestroError::MissingInput("transcribe requires exactly one input file".to_string())
    })?;
    layout.validate().await?;
    let registry = default_transcribers();
    Ok(transcribe_file(&registry, input, &layout.procedures_dir).await?)
}
