//! Transcribe a source file and store the result as a procedure definition

use crate::error::TranscribeError;
use crate::registry::{default_transcribers, TranscriberRegistry};
use maestro_model::{Procedure, ProcedureDefinition};
use std::path::{Path, PathBuf};

/// Directory under the project root where definitions are stored
pub const PROCEDURES_DIR: &str = "procedures";

/// Outcome of a successful transcription
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Recovered definition, tasks inline
    pub definition: ProcedureDefinition,
    /// Where the definition was written
    pub destination: PathBuf,
}

/// Transcribe `source` with the built-in transcribers into
/// `<project_dir>/procedures/<stem>.yml`
///
/// # Errors
/// See [`transcribe_file`].
pub async fn transcribe(source: &Path, project_dir: &Path) -> Result<Transcription, TranscribeError> {
    transcribe_file(&default_transcribers(), source, &project_dir.join(PROCEDURES_DIR)).await
}

/// Transcribe `source` into `<procedures_dir>/<stem>.yml`
///
/// The extension is checked before the file is opened. The recovered
/// definition is validated as a procedure before anything is written, so a
/// failed transcription leaves no file behind.
///
/// # Errors
/// - `TranscribeError::UnsupportedExtension` for an unmapped extension
/// - `TranscribeError::Io` reading the source or writing the definition
/// - `TranscribeError::Structural` / `Definition` for malformed sources
pub async fn transcribe_file(
    registry: &TranscriberRegistry,
    source: &Path,
    procedures_dir: &Path,
) -> Result<Transcription, TranscribeError> {
    let transcriber = registry.require_for_path(source)?;
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| TranscribeError::structural(source, "input has no file name"))?;

    let bytes = tokio::fs::read(source)
        .await
        .map_err(|e| TranscribeError::io_error(source, e))?;
    let definition = transcriber.transcribe(&bytes, source)?;

    let procedure = Procedure::from_definition(&definition, stem.as_str(), source)?;

    let destination = procedures_dir.join(format!("{stem}.yml"));
    let yaml = definition.to_yaml(&destination)?;
    tokio::fs::create_dir_all(procedures_dir)
        .await
        .map_err(|e| TranscribeError::io_error(procedures_dir, e))?;
    tokio::fs::write(&destination, yaml)
        .await
        .map_err(|e| TranscribeError::io_error(&destination, e))?;

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        transcriber = transcriber.name(),
        tasks = procedure.tasks().len(),
        "transcribed procedure"
    );
    Ok(Transcription {
        definition,
        destination,
    })
}
