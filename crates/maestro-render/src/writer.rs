//! Two-phase writer contract and output format selection
//!
//! Every backend renders in the same order:
//! 1. `render_intro` (front matter, may read assets)
//! 2. `render_tasks` (every task in procedure order)
//! 3. `write_file`
//!
//! Writing before the tasks are rendered yields an incomplete document;
//! that ordering is the caller's responsibility.

use crate::docx::DocxWriter;
use crate::error::RenderError;
use crate::geometry::PageGeometry;
use crate::html::HtmlWriter;
use crate::markdown::MarkdownWriter;
use crate::program::ProgramInfo;
use crate::xml::XmlWriter;
use async_trait::async_trait;
use maestro_model::{is_plain_file_name, Procedure, TimeSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output formats a procedure can be composed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Paginated DOCX, landscape EVA layout
    EvaDocx,
    /// Paginated DOCX, portrait SODF layout
    SodfDocx,
    /// Interchange XML keyed by document id
    IpvXml,
    /// Styled HTML
    Html,
    /// Markdown with YAML front matter
    Markdown,
}

impl OutputFormat {
    /// Every format, in compose order
    pub const ALL: [Self; 5] = [
        Self::EvaDocx,
        Self::SodfDocx,
        Self::IpvXml,
        Self::Html,
        Self::Markdown,
    ];

    /// Format chosen when none is requested
    pub const DEFAULT: Self = Self::EvaDocx;

    /// Name used on the command line
    #[must_use]
    pub const fn option_name(self) -> &'static str {
        match self {
            Self::EvaDocx => "eva-docx",
            Self::SodfDocx => "sodf-docx",
            Self::IpvXml => "ipv-xml",
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }

    /// Where this format writes `procedure` under `output_dir`
    ///
    /// Interchange XML nests under the procedure's document id:
    /// `<out>/<id>/<id>.xml`. Every other format writes
    /// `<out>/<filename>.<ext>`.
    ///
    /// # Errors
    /// - `RenderError::MissingField` if the XML format has no document id
    /// - `RenderError::InvalidField` if the document id is not a plain file
    ///   name, so the output would land outside `output_dir`
    pub fn destination(self, procedure: &Procedure, output_dir: &Path) -> Result<PathBuf, RenderError> {
        let file = |suffix: &str| output_dir.join(format!("{}{suffix}", procedure.filename));
        Ok(match self {
            Self::EvaDocx => file(".docx"),
            Self::SodfDocx => file(".sodf.docx"),
            Self::Html => file(".eva.html"),
            Self::Markdown => file(".md"),
            Self::IpvXml => {
                let id = procedure.document_id().ok_or_else(|| self.missing_document_id(procedure))?;
                if !is_plain_file_name(id) {
                    return Err(RenderError::InvalidField {
                        format: self.option_name(),
                        field: maestro_model::DOCUMENT_ID_FIELD,
                        value: id.to_string(),
                        procedure: procedure.name.clone(),
                    });
                }
                output_dir.join(id).join(format!("{id}.xml"))
            }
        })
    }

    pub(crate) fn missing_document_id(self, procedure: &Procedure) -> RenderError {
        RenderError::MissingField {
            format: self.option_name(),
            field: maestro_model::DOCUMENT_ID_FIELD,
            procedure: procedure.name.clone(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.option_name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|f| f.option_name()).collect();
                format!("unknown output format '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Format-specific knobs shared by all writers
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// EVA DOCX page layout
    pub eva_geometry: PageGeometry,
    /// SODF DOCX page layout
    pub sodf_geometry: PageGeometry,
    /// Stylesheet replacing the built-in HTML one
    pub stylesheet: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            eva_geometry: PageGeometry::eva(),
            sodf_geometry: PageGeometry::sodf(),
            stylesheet: None,
        }
    }
}

/// A format backend
#[async_trait]
pub trait ProcedureWriter: Send + Sync {
    /// Format this writer produces
    fn format(&self) -> OutputFormat;

    /// Document-level front matter; completes before tasks render
    async fn render_intro(&mut self) -> Result<(), RenderError>;

    /// Append every task in procedure order
    fn render_tasks(&mut self) -> Result<(), RenderError>;

    /// Serialized document as accumulated so far
    fn to_bytes(&self) -> Result<Vec<u8>, RenderError>;

    /// Write the accumulated document, creating parent directories
    async fn write_file(&self, destination: &Path) -> Result<(), RenderError> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RenderError::io_error(parent, e))?;
        }
        tokio::fs::write(destination, bytes)
            .await
            .map_err(|e| RenderError::io_error(destination, e))?;
        tracing::info!(
            format = %self.format(),
            path = %destination.display(),
            "wrote procedure output"
        );
        Ok(())
    }
}

/// Writer for `format` over `procedure`
#[must_use]
pub fn writer_for<'a>(
    format: OutputFormat,
    procedure: &'a Procedure,
    program: &'a ProgramInfo,
    options: &RenderOptions,
) -> Box<dyn ProcedureWriter + 'a> {
    match format {
        OutputFormat::EvaDocx => Box::new(DocxWriter::new(procedure, program, format, options.eva_geometry)),
        OutputFormat::SodfDocx => Box::new(DocxWriter::new(procedure, program, format, options.sodf_geometry)),
        OutputFormat::IpvXml => Box::new(XmlWriter::new(procedure, program)),
        OutputFormat::Html => Box::new(HtmlWriter::new(procedure, program, options.stylesheet.clone())),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(procedure, program)),
    }
}

/// Run both phases and write to `destination`
///
/// # Errors
/// The first error of any phase; later phases are not attempted.
pub async fn render_procedure(
    writer: &mut (dyn ProcedureWriter + '_),
    destination: &Path,
) -> Result<(), RenderError> {
    writer.render_intro().await?;
    writer.render_tasks()?;
    writer.write_file(destination).await
}

/// Render `procedure` as `format` into `output_dir`, returning the path
///
/// # Errors
/// Missing fields, serialization or I/O failures.
pub async fn compose_format(
    format: OutputFormat,
    procedure: &Procedure,
    program: &ProgramInfo,
    options: &RenderOptions,
    output_dir: &Path,
) -> Result<PathBuf, RenderError> {
    let destination = format.destination(procedure, output_dir)?;
    let mut writer = writer_for(format, procedure, program, options);
    render_procedure(writer.as_mut(), &destination).await?;
    Ok(destination)
}

/// Text surfaced before a task that starts after idle time
#[must_use]
pub fn gap_notice(gap: TimeSpan) -> String {
    match gap.whole_minutes() {
        0 => format!("{} seconds wasted before this activity", gap.as_seconds()),
        1 => "1 minute wasted before this activity".to_string(),
        minutes => format!("{minutes} minutes wasted before this activity"),
    }
}

pub(crate) fn sequence_error(format: OutputFormat) -> RenderError {
    RenderError::Sequence {
        format: format.option_name(),
        message: "render_tasks called before render_intro completed",
    }
}
