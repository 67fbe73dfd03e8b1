//! Markdown backend
//!
//! Procedure metadata goes into YAML front matter. The body uses one heading
//! level per layer: `##` task, `###` division, `####` column key. Steps are
//! list items prefixed with their `[HH:MM:SS]` duration; details are nested
//! items with an upper-case label.

use crate::error::RenderError;
use crate::program::ProgramInfo;
use crate::writer::{gap_notice, sequence_error, OutputFormat, ProcedureWriter};
use async_trait::async_trait;
use maestro_model::{Procedure, ProcedureDefinition, Step, Task, TaskTiming};
use std::fmt::Write as _;

/// Labels for nested step detail items
pub const DETAIL_LABELS: [&str; 5] = ["TITLE", "WARNING", "CAUTION", "NOTE", "CHECKBOX"];

/// Markdown writer
pub struct MarkdownWriter<'a> {
    procedure: &'a Procedure,
    program: &'a ProgramInfo,
    document: String,
    intro_rendered: bool,
}

impl<'a> MarkdownWriter<'a> {
    /// Create writer
    #[must_use]
    pub fn new(procedure: &'a Procedure, program: &'a ProgramInfo) -> Self {
        Self {
            procedure,
            program,
            document: String::new(),
            intro_rendered: false,
        }
    }

    fn render_task(&mut self, task: &Task, timing: &TaskTiming) {
        let out = &mut self.document;
        let _ = writeln!(out, "## {}\n", single_line(task.title()));
        if let Some(start) = task.start() {
            let _ = writeln!(out, "Start: {}\n", start.to_clock());
        }
        let _ = writeln!(out, "Duration: {}\n", timing.duration);
        if timing.has_gap() {
            let _ = writeln!(out, "> {}\n", gap_notice(timing.gap_before));
        }

        for (position, division) in task.divisions().iter().enumerate() {
            let _ = writeln!(out, "### Division {}\n", position + 1);
            for (column, steps) in division.columns() {
                let _ = writeln!(out, "#### {column}\n");
                for step in steps {
                    write_step(out, step);
                }
                if !steps.is_empty() {
                    out.push('\n');
                }
            }
        }
    }
}

fn write_step(out: &mut String, step: &Step) {
    let _ = writeln!(out, "- [{}] {}", step.duration.to_clock(), single_line(&step.text));
    let details = [
        (DETAIL_LABELS[0], step.title.as_slice()),
        (DETAIL_LABELS[1], step.warnings.as_slice()),
        (DETAIL_LABELS[2], step.cautions.as_slice()),
        (DETAIL_LABELS[3], step.notes.as_slice()),
        (DETAIL_LABELS[4], step.checkboxes.as_slice()),
    ];
    for (label, entries) in details {
        for entry in entries {
            let _ = writeln!(out, "  - {label}: {}", single_line(entry));
        }
    }
}

/// Newlines would end the list item or heading
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl ProcedureWriter for MarkdownWriter<'_> {
    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }

    async fn render_intro(&mut self) -> Result<(), RenderError> {
        let procedure = self.procedure;
        let front_matter = ProcedureDefinition {
            tasks: Vec::new(),
            ..procedure.definition()
        };
        let yaml = serde_yaml::to_string(&front_matter).map_err(RenderError::serialization)?;

        let out = &mut self.document;
        let _ = write!(out, "---\n{yaml}---\n\n");
        let _ = writeln!(out, "# {}\n", single_line(&procedure.name));
        if let Some(description) = &procedure.description {
            let _ = writeln!(out, "{description}\n");
        }
        let _ = writeln!(
            out,
            "<!-- {} -->\n",
            self.program.footer_line(&procedure.name).replace("--", "-")
        );
        self.intro_rendered = true;
        Ok(())
    }

    fn render_tasks(&mut self) -> Result<(), RenderError> {
        if !self.intro_rendered {
            return Err(sequence_error(OutputFormat::Markdown));
        }
        let procedure = self.procedure;
        for (task, timing) in procedure.tasks().iter().zip(procedure.timeline()) {
            self.render_task(task, &timing);
        }
        Ok(())
    }

    fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        Ok(self.document.clone().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const YAML: &str = r#"
procedure_name: Airlock Egress
fields:
  document_id: EV1-1234
tasks:
  - title: Prep
    steps:
      - IV:
          - step: "Configure\nairlock"
            duration: { minutes: 5 }
            note: [check twice]
        EV1: []
"#;

    #[tokio::test]
    async fn renders_headings_and_detail_items() {
        let def = ProcedureDefinition::from_yaml(YAML, Path::new("p.yml")).unwrap();
        let procedure = Procedure::from_definition(&def, "p", Path::new("p.yml")).unwrap();
        let program = ProgramInfo::default();
        let mut writer = MarkdownWriter::new(&procedure, &program);
        writer.render_intro().await.unwrap();
        writer.render_tasks().unwrap();
        let markdown = String::from_utf8(writer.to_bytes().unwrap()).unwrap();

        assert!(markdown.starts_with("---\n"));
        assert!(markdown.contains("document_id: EV1-1234"));
        assert!(markdown.contains("## Prep\n"));
        assert!(markdown.contains("### Division 1\n"));
        assert!(markdown.contains("#### IV\n"));
        assert!(markdown.contains("#### EV1\n"));
        assert!(markdown.contains("- [00:05:00] Configure airlock\n"));
        assert!(markdown.contains("  - NOTE: check twice\n"));
    }
}
