//! Identity of the program producing documents
//!
//! Writers only read this bag; discovering the git provenance is done by the
//! caller.

use serde::Serialize;

/// Version-control provenance of the project being rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitProvenance {
    /// Short commit hash
    pub hash: String,
    /// Commit date as reported by git
    pub date: String,
    /// Whether the working tree has uncommitted changes
    pub uncommitted: bool,
}

impl GitProvenance {
    /// `abc1234 (2024-01-05)` plus a dirty marker
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!("{} ({})", self.hash, self.date);
        if self.uncommitted {
            summary.push_str(" with uncommitted changes");
        }
        summary
    }
}

/// Program identity shown in document front matter and footers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramInfo {
    /// Short program name
    pub name: String,
    /// Full program name, used as document title
    pub full_name: String,
    /// Program version
    pub version: String,
    /// Project repository URL
    pub repo_url: Option<String>,
    /// Git provenance, when the project is a repository
    pub git: Option<GitProvenance>,
}

impl ProgramInfo {
    /// Create with name and version
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            version: version.into(),
            repo_url: None,
            git: None,
        }
    }

    /// With full name
    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    /// With repository URL
    #[must_use]
    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    /// With git provenance
    #[must_use]
    pub fn with_git(mut self, git: Option<GitProvenance>) -> Self {
        self.git = git;
        self
    }

    /// One-line footer text for `procedure`
    #[must_use]
    pub fn footer_line(&self, procedure: &str) -> String {
        let mut line = format!("{procedure} - {} {}", self.full_name, self.version);
        if let Some(git) = &self.git {
            line.push_str(", version ");
            line.push_str(&git.summary());
        }
        line
    }
}

impl Default for ProgramInfo {
    fn default() -> Self {
        Self::new("maestro", crate::VERSION)
    }
}
