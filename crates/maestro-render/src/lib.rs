//! Maestro Render - procedure writers
//!
//! Projects a [`maestro_model::Procedure`] into output documents. Every
//! backend implements [`ProcedureWriter`]:
//! - `render_intro` writes front matter and must complete first
//! - `render_tasks` appends tasks in procedure order
//! - `write_file` serializes to the destination
//!
//! Backends:
//! - DOCX in two page geometries (EVA landscape, SODF portrait)
//! - interchange XML, written under the procedure's document id
//! - styled HTML from a template with an inlined stylesheet
//! - Markdown with YAML front matter
//!
//! # Example
//!
//! ```rust,ignore
//! use maestro_render::{compose_format, OutputFormat, ProgramInfo, RenderOptions};
//!
//! # async fn example(procedure: maestro_model::Procedure) -> Result<(), Box<dyn std::error::Error>> {
//! let program = ProgramInfo::default();
//! let path = compose_format(
//!     OutputFormat::IpvXml,
//!     &procedure,
//!     &program,
//!     &RenderOptions::default(),
//!     std::path::Path::new("build"),
//! )
//! .await?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod docx;
pub mod error;
pub mod geometry;
pub mod html;
pub mod markdown;
mod markup;
pub mod program;
pub mod writer;
pub mod xml;

pub use docx::DocxWriter;
pub use error::RenderError;
pub use geometry::{Margins, Orientation, PageGeometry};
pub use html::HtmlWriter;
pub use markdown::MarkdownWriter;
pub use program::{GitProvenance, ProgramInfo};
pub use writer::{
    compose_format, gap_notice, render_procedure, writer_for, OutputFormat, ProcedureWriter,
    RenderOptions,
};
pub use xml::XmlWriter;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for rendering procedures
    pub use crate::{
        compose_format, OutputFormat, PageGeometry, ProcedureWriter, ProgramInfo, RenderError,
        RenderOptions,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
