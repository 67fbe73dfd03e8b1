//! Maestro Core - project-level operations
//!
//! Ties the procedure model, the writers and the transcribers to a project
//! on disk:
//!
//! - [`ProjectLayout`]: required `procedures/` and `tasks/`, created output dir
//! - [`MaestroConfig`]: optional `maestro.toml`
//! - [`Composer`]: batch compose with per-file isolation
//! - [`transcribe_input`]: external document → stored definition
//! - [`EditorSession`]: ordered structural edits with save-on-change
//!
//! # Example
//!
//! ```rust,ignore
//! use maestro_core::{resolve_formats, Composer, MaestroConfig};
//!
//! # async fn example() -> maestro_core::Result<()> {
//! let project = std::path::Path::new("project");
//! let config = MaestroConfig::load(project).await?;
//! let composer = Composer::open(project, &config).await?;
//! let report = composer.compose_all(&resolve_formats(&[], true)).await?;
//! println!("{} outputs, {} failures", report.outputs.len(), report.failures.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod compose;
pub mod config;
pub mod error;
pub mod git;
pub mod intake;
pub mod project;
pub mod session;

pub use compose::{resolve_formats, ComposeFailure, ComposeReport, ComposedOutput, Composer};
pub use config::{MaestroConfig, CONFIG_FILE};
pub use error::{MaestroError, Result};
pub use intake::transcribe_input;
pub use project::ProjectLayout;
pub use session::{EditorSession, TimelineEntry};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for Maestro tooling
    pub use crate::{
        resolve_formats, transcribe_input, ComposeReport, Composer, EditorSession, MaestroConfig,
        MaestroError, ProjectLayout, Result,
    };
    pub use maestro_render::OutputFormat;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
