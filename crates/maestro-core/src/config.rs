//! Project configuration
//!
//! Read from an optional `maestro.toml` at the project root:
//!
//! ```toml
//! procedures_dir = "procedures"
//! tasks_dir = "tasks"
//! output_dir = "build"
//! stylesheet = "style/custom.css"
//! repo_url = "https://example.org/procedures"
//!
//! [eva_geometry]
//! width = 12240
//! height = 15840
//! orientation = "landscape"
//! right_tab_position = 14400
//! margins = { top = 720, right = 720, bottom = 720, left = 720 }
//! ```

use crate::error::{MaestroError, Result};
use maestro_render::{PageGeometry, RenderOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file name at the project root
pub const CONFIG_FILE: &str = "maestro.toml";

/// Maestro project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaestroConfig {
    /// Stored procedure definitions, relative to the project root
    pub procedures_dir: PathBuf,
    /// Referenced task files
    pub tasks_dir: PathBuf,
    /// Rendered outputs; created when absent
    pub output_dir: PathBuf,
    /// Stylesheet replacing the built-in HTML one
    pub stylesheet: Option<PathBuf>,
    /// Project repository URL shown in document footers
    pub repo_url: Option<String>,
    /// Override for the landscape DOCX layout
    pub eva_geometry: Option<PageGeometry>,
    /// Override for the portrait DOCX layout
    pub sodf_geometry: Option<PageGeometry>,
}

impl MaestroConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `maestro.toml` from `project_dir`, or defaults when absent
    ///
    /// # Errors
    /// - `MaestroError::StructuralParse` naming `maestro.toml` if malformed
    /// - `MaestroError::Io` if it exists but can't be read
    pub async fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(MaestroError::io_error(&path, e)),
        };
        Self::from_toml(&content, &path)
    }

    /// Parse TOML content, attributing errors to `origin`
    ///
    /// # Errors
    /// `MaestroError::StructuralParse` naming `origin`.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| MaestroError::structural(origin, e.message()))
    }

    /// With procedures directory
    #[inline]
    #[must_use]
    pub fn with_procedures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.procedures_dir = dir.into();
        self
    }

    /// With tasks directory
    #[inline]
    #[must_use]
    pub fn with_tasks_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tasks_dir = dir.into();
        self
    }

    /// With output directory
    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// With HTML stylesheet override
    #[inline]
    #[must_use]
    pub fn with_stylesheet(mut self, stylesheet: impl Into<PathBuf>) -> Self {
        self.stylesheet = Some(stylesheet.into());
        self
    }

    /// With repository URL
    #[inline]
    #[must_use]
    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    /// With landscape DOCX geometry
    #[inline]
    #[must_use]
    pub fn with_eva_geometry(mut self, geometry: PageGeometry) -> Self {
        self.eva_geometry = Some(geometry);
        self
    }

    /// With portrait DOCX geometry
    #[inline]
    #[must_use]
    pub fn with_sodf_geometry(mut self, geometry: PageGeometry) -> Self {
        self.sodf_geometry = Some(geometry);
        self
    }

    /// Writer options, resolving the stylesheet against `project_dir`
    #[must_use]
    pub fn render_options(&self, project_dir: &Path) -> RenderOptions {
        let defaults = RenderOptions::default();
        RenderOptions {
            eva_geometry: self.eva_geometry.unwrap_or(defaults.eva_geometry),
            sodf_geometry: self.sodf_geometry.unwrap_or(defaults.sodf_geometry),
            stylesheet: self.stylesheet.as_ref().map(|path| project_dir.join(path)),
        }
    }
}

impl Default for MaestroConfig {
    fn default() -> Self {
        Self {
            procedures_dir: PathBuf::from("procedures"),
            tasks_dir: PathBuf::from("tasks"),
            output_dir: PathBuf::from("build"),
            stylesheet: None,
            repo_url: None,
            eva_geometry: None,
            sodf_geometry: None,
        }
    }
}
