//! Batch compose: stored definitions → rendered outputs
//!
//! Files are isolated from each other: a malformed definition is reported
//! and skipped. Formats for one file are rendered in order; a per-format
//! failure (such as a missing `document_id`) is reported and the next format
//! still runs, while a fatal writer error stops that file. Directory and
//! permission failures stop the whole batch, since every later file would
//! hit them too.

use crate::config::MaestroConfig;
use crate::error::{MaestroError, Result};
use crate::git;
use crate::project::ProjectLayout;
use maestro_model::Procedure;
use maestro_render::{compose_format, gap_notice, OutputFormat, ProgramInfo, RenderError, RenderOptions};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Formats to produce: every format when `all`, the default when none
/// are requested, otherwise the requested ones without duplicates
#[must_use]
pub fn resolve_formats(requested: &[OutputFormat], all: bool) -> Vec<OutputFormat> {
    if all {
        return OutputFormat::ALL.to_vec();
    }
    if requested.is_empty() {
        return vec![OutputFormat::DEFAULT];
    }
    let mut formats = Vec::with_capacity(requested.len());
    for format in requested {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }
    formats
}

/// One output written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedOutput {
    pub source: PathBuf,
    pub format: OutputFormat,
    pub path: PathBuf,
}

/// One failure, with the format when it was format-specific
#[derive(Debug)]
pub struct ComposeFailure {
    pub source: PathBuf,
    pub format: Option<OutputFormat>,
    pub error: MaestroError,
}

/// Result of a compose run
#[derive(Debug, Default)]
pub struct ComposeReport {
    pub outputs: Vec<ComposedOutput>,
    pub failures: Vec<ComposeFailure>,
}

impl ComposeReport {
    /// True when nothing failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of definitions skipped as malformed
    #[must_use]
    pub fn structural_errors(&self) -> usize {
        self.failures
            .iter()
            .filter(|failure| matches!(failure.error, MaestroError::StructuralParse { .. }))
            .count()
    }

    /// Outputs written for `source`
    pub fn outputs_for<'a>(&'a self, source: &'a Path) -> impl Iterator<Item = &'a ComposedOutput> + 'a {
        self.outputs.iter().filter(move |output| output.source == source)
    }

    fn fail(&mut self, source: &Path, format: Option<OutputFormat>, error: MaestroError) {
        tracing::error!(
            source = %source.display(),
            format = format.map(OutputFormat::option_name),
            error = %error,
            "compose failed"
        );
        self.failures.push(ComposeFailure {
            source: source.to_path_buf(),
            format,
            error,
        });
    }
}

/// Renders stored definitions of one project
#[derive(Debug, Clone)]
pub struct Composer {
    layout: ProjectLayout,
    options: RenderOptions,
    program: ProgramInfo,
}

impl Composer {
    /// Create from resolved parts
    #[must_use]
    pub fn new(layout: ProjectLayout, options: RenderOptions, program: ProgramInfo) -> Self {
        Self {
            layout,
            options,
            program,
        }
    }

    /// Validate the project at `project_dir` and prepare its output directory
    ///
    /// # Errors
    /// Fatal layout errors: `PathNotFound`, `PermissionDenied`, `Io`.
    pub async fn open(project_dir: &Path, config: &MaestroConfig) -> Result<Self> {
        let layout = ProjectLayout::new(project_dir, config);
        layout.validate().await?;
        layout.prepare_output().await?;
        let program = git::program_info(project_dir, config.repo_url.as_deref()).await;
        Ok(Self::new(layout, config.render_options(project_dir), program))
    }

    /// Project directories
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Program identity written into outputs
    #[must_use]
    pub fn program(&self) -> &ProgramInfo {
        &self.program
    }

    /// Compose every definition in the procedures directory
    ///
    /// # Errors
    /// Only when the procedures directory can't be listed; per-file problems
    /// are collected in the report.
    pub async fn compose_all(&self, formats: &[OutputFormat]) -> Result<ComposeReport> {
        let files = self.layout.procedure_files().await?;
        if files.is_empty() {
            tracing::warn!(
                dir = %self.layout.procedures_dir.display(),
                "no procedure definitions found"
            );
        }
        Ok(self.compose_files(&files, formats).await)
    }

    /// Compose the given definition files
    ///
    /// Stops early, leaving later files unattempted, after a failure that
    /// would repeat for every file.
    pub async fn compose_files(&self, files: &[PathBuf], formats: &[OutputFormat]) -> ComposeReport {
        let mut report = ComposeReport::default();
        for (done, file) in files.iter().enumerate() {
            if self.compose_file(file, formats, &mut report).await.is_break() {
                tracing::error!(
                    skipped = files.len() - done - 1,
                    "stopping compose after directory or permission failure"
                );
                break;
            }
        }
        tracing::info!(
            files = files.len(),
            outputs = report.outputs.len(),
            failures = report.failures.len(),
            "compose finished"
        );
        report
    }

    /// Compose one definition file into `report`
    ///
    /// Breaks when the failure is not specific to this file.
    pub async fn compose_file(
        &self,
        file: &Path,
        formats: &[OutputFormat],
        report: &mut ComposeReport,
    ) -> ControlFlow<()> {
        let procedure = match Procedure::load_with_tasks_dir(file, &self.layout.tasks_dir).await {
            Ok(procedure) => procedure,
            Err(e) => {
                let error = MaestroError::from(e);
                let flow = self.batch_flow(&error);
                report.fail(file, None, error);
                return flow;
            }
        };
        warn_gaps(&procedure);

        for &format in formats {
            match compose_format(format, &procedure, &self.program, &self.options, &self.layout.output_dir).await {
                Ok(path) => report.outputs.push(ComposedOutput {
                    source: file.to_path_buf(),
                    format,
                    path,
                }),
                Err(e) => {
                    let fatal = e.is_fatal();
                    let error = MaestroError::from(e);
                    let flow = self.batch_flow(&error);
                    report.fail(file, Some(format), error);
                    if flow.is_break() {
                        return flow;
                    }
                    if fatal {
                        break;
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Break for permission problems and failures on the output directory
    fn batch_flow(&self, error: &MaestroError) -> ControlFlow<()> {
        let output_dir_failed = matches!(
            error,
            MaestroError::Render(RenderError::Io { path, .. }) if self.layout.output_dir.starts_with(path)
        );
        if error.stops_batch() || output_dir_failed {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn warn_gaps(procedure: &Procedure) {
    for timing in procedure.timeline().iter().filter(|timing| timing.has_gap()) {
        let title = procedure
            .tasks()
            .get_by_id(timing.task_id)
            .map(|task| task.title())
            .unwrap_or_default();
        tracing::warn!(
            procedure = %procedure.name,
            task = title,
            gap = %timing.gap_before,
            "{}",
            gap_notice(timing.gap_before)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_format_when_none_requested() {
        assert_eq!(resolve_formats(&[], false), vec![OutputFormat::DEFAULT]);
    }

    #[test]
    fn all_overrides_selection() {
        assert_eq!(
            resolve_formats(&[OutputFormat::Html], true),
            OutputFormat::ALL.to_vec()
        );
    }

    #[test]
    fn requested_formats_keep_order_without_duplicates() {
        assert_eq!(
            resolve_formats(
                &[OutputFormat::Markdown, OutputFormat::Html, OutputFormat::Markdown],
                false
            ),
            vec![OutputFormat::Markdown, OutputFormat::Html]
        );
    }

    #[test]
    fn report_counts_structural_errors() {
        let mut report = ComposeReport::default();
        report.fail(
            Path::new("a.yml"),
            None,
            MaestroError::structural("a.yml", "bad"),
        );
        report.fail(
            Path::new("b.yml"),
            Some(OutputFormat::IpvXml),
            MaestroError::MissingInput("x".to_string()),
        );
        assert_eq!(report.structural_errors(), 1);
        assert!(!report.is_success());
    }
}
