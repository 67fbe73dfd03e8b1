//! Project layout
//!
//! A project is a directory holding `procedures/` and `tasks/` (names are
//! configurable). Both must exist before composing or transcribing; the
//! output directory is created on demand and must be writable.

use crate::config::MaestroConfig;
use crate::error::{MaestroError, Result};
use std::path::{Path, PathBuf};

const WRITE_PROBE: &str = ".maestro-write-probe";

/// Resolved directories of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub procedures_dir: PathBuf,
    pub tasks_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ProjectLayout {
    /// Resolve the configured directories against `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: &MaestroConfig) -> Self {
        let root = root.into();
        Self {
            procedures_dir: root.join(&config.procedures_dir),
            tasks_dir: root.join(&config.tasks_dir),
            output_dir: root.join(&config.output_dir),
            root,
        }
    }

    /// Check that the procedures and tasks directories exist
    ///
    /// # Errors
    /// `MaestroError::PathNotFound` naming the first missing directory.
    pub async fn validate(&self) -> Result<()> {
        require_dir(&self.tasks_dir, "tasks").await?;
        require_dir(&self.procedures_dir, "procedures").await
    }

    /// Create the output directory and check it can be written
    ///
    /// # Errors
    /// `MaestroError::PermissionDenied` when the directory can't be created
    /// or written; `MaestroError::Io` for other failures.
    pub async fn prepare_output(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| MaestroError::io_error(&self.output_dir, e))?;

        let probe = self.output_dir.join(WRITE_PROBE);
        tokio::fs::write(&probe, b"")
            .await
            .map_err(|e| MaestroError::io_error(&self.output_dir, e))?;
        tokio::fs::remove_file(&probe)
            .await
            .map_err(|e| MaestroError::io_error(&probe, e))
    }

    /// Stored definitions (`.yml` / `.yaml`) in the procedures directory, sorted
    ///
    /// # Errors
    /// `MaestroError::PathNotFound` or `MaestroError::Io` reading the directory.
    pub async fn procedure_files(&self) -> Result<Vec<PathBuf>> {
        require_dir(&self.procedures_dir, "procedures").await?;
        let mut entries = tokio::fs::read_dir(&self.procedures_dir)
            .await
            .map_err(|e| MaestroError::io_error(&self.procedures_dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MaestroError::io_error(&self.procedures_dir, e))?
        {
            let path = entry.path();
            if path.is_file() && is_definition(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn is_definition(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

async fn require_dir(path: &Path, expected: &'static str) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(MaestroError::path_not_found(path, expected)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(MaestroError::path_not_found(path, expected))
        }
        Err(e) => Err(MaestroError::io_error(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_test_utils::{TestProject, AIRLOCK_EGRESS};
    use pretty_assertions::assert_eq;

    fn layout(project: &TestProject) -> ProjectLayout {
        ProjectLayout::new(project.path(), &MaestroConfig::default())
    }

    #[tokio::test]
    async fn complete_project_validates() {
        let project = TestProject::new();
        layout(&project).validate().await.unwrap();
    }

    #[tokio::test]
    async fn missing_tasks_dir_is_named() {
        let project = TestProject::bare();
        let err = layout(&project).validate().await.unwrap_err();
        let MaestroError::PathNotFound { path, expected } = &err else {
            panic!("expected PathNotFound, got {err:?}");
        };
        assert_eq!(*expected, "tasks");
        assert_eq!(path, &project.tasks_dir());
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn output_dir_is_created() {
        let project = TestProject::new();
        let layout = layout(&project);
        layout.prepare_output().await.unwrap();
        assert!(project.output_dir().is_dir());
        assert!(!project.output_dir().join(WRITE_PROBE).exists());
    }

    #[tokio::test]
    async fn output_path_occupied_by_file_is_fatal() {
        let project = TestProject::new().with_file("build", b"not a directory");
        let err = layout(&project).prepare_output().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.path(), Some(project.output_dir().as_path()));
    }

    #[tokio::test]
    async fn lists_only_definitions_sorted() {
        let project = TestProject::new()
            .with_procedure("b.yml", AIRLOCK_EGRESS)
            .with_procedure("a.yaml", AIRLOCK_EGRESS)
            .with_procedure("notes.txt", "ignored");
        let files = layout(&project).procedure_files().await.unwrap();
        assert_eq!(
            files,
            vec![project.procedure_path("a.yaml"), project.procedure_path("b.yml")]
        );
    }

    #[test]
    fn configured_names_are_joined() {
        let config = MaestroConfig::new().with_tasks_dir("activities").with_output_dir("out");
        let layout = ProjectLayout::new("/p", &config);
        assert_eq!(layout.tasks_dir, PathBuf::from("/p/activities"));
        assert_eq!(layout.output_dir, PathBuf::from("/p/out"));
        assert_eq!(layout.procedures_dir, PathBuf::from("/p/procedures"));
    }
}
