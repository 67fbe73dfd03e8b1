//! Interchange XML backend
//!
//! ```xml
//! <procedure documentId="EV1-1234" name="Airlock Egress">
//!   <metadata>...</metadata>
//!   <columns><column key="IV" display="IV/SSRMS"/></columns>
//!   <task title="Prep" duration="00:30:00">
//!     <division>
//!       <column key="IV">
//!         <step durationSeconds="300"><text>Configure</text></step>
//!       </column>
//!     </division>
//!   </task>
//! </procedure>
//! ```
//!
//! Every division lists every task column, empty or not, so the task's
//! column assignment survives transcription.

use crate::error::RenderError;
use crate::markup::Markup;
use crate::program::ProgramInfo;
use crate::writer::{sequence_error, OutputFormat, ProcedureWriter};
use async_trait::async_trait;
use maestro_model::{Procedure, Step, Task, TaskTiming};

/// Interchange XML writer
pub struct XmlWriter<'a> {
    procedure: &'a Procedure,
    program: &'a ProgramInfo,
    markup: Markup<Vec<u8>>,
    intro_rendered: bool,
}

impl<'a> XmlWriter<'a> {
    /// Create writer
    #[must_use]
    pub fn new(procedure: &'a Procedure, program: &'a ProgramInfo) -> Self {
        Self {
            procedure,
            program,
            markup: Markup::indented(Vec::new()),
            intro_rendered: false,
        }
    }

    fn render_task(&mut self, task: &Task, timing: &TaskTiming) -> Result<(), RenderError> {
        let xml = &mut self.markup;
        let duration = timing.duration.to_clock();
        let gap = timing.gap_before.to_clock();
        let start = task.start().map(|s| s.to_clock());

        let mut attributes = vec![("title", task.title()), ("duration", duration.as_str())];
        if let Some(start) = &start {
            attributes.push(("start", start.as_str()));
        }
        if timing.has_gap() {
            attributes.push(("gapBefore", gap.as_str()));
        }
        if let Some(file) = task.source_file() {
            attributes.push(("sourceFile", file));
        }
        xml.open("task", &attributes)?;

        for division in task.divisions() {
            xml.open("division", &[])?;
            for (column, steps) in division.columns() {
                if steps.is_empty() {
                    xml.empty("column", &[("key", column)])?;
                    continue;
                }
                xml.open("column", &[("key", column)])?;
                for step in steps {
                    render_step(xml, step)?;
                }
                xml.close("column")?;
            }
            xml.close("division")?;
        }
        xml.close("task")
    }
}

fn render_step(xml: &mut Markup<Vec<u8>>, step: &Step) -> Result<(), RenderError> {
    let seconds = step.duration.as_seconds().to_string();
    let mut attributes = vec![("durationSeconds", seconds.as_str())];
    if let Some(title) = &step.title {
        attributes.push(("title", title.as_str()));
    }
    xml.open("step", &attributes)?;
    xml.element("text", &[], &step.text)?;
    for (name, entries) in [
        ("warning", &step.warnings),
        ("caution", &step.cautions),
        ("note", &step.notes),
        ("checkbox", &step.checkboxes),
    ] {
        for entry in entries {
            xml.element(name, &[], entry)?;
        }
    }
    xml.close("step")
}

#[async_trait]
impl ProcedureWriter for XmlWriter<'_> {
    fn format(&self) -> OutputFormat {
        OutputFormat::IpvXml
    }

    async fn render_intro(&mut self) -> Result<(), RenderError> {
        let procedure = self.procedure;
        let document_id = procedure
            .document_id()
            .ok_or_else(|| OutputFormat::IpvXml.missing_document_id(procedure))?;
        let xml = &mut self.markup;

        xml.declaration()?;
        xml.open(
            "procedure",
            &[("documentId", document_id), ("name", procedure.name.as_str())],
        )?;

        xml.open("metadata", &[])?;
        if let Some(description) = &procedure.description {
            xml.element("description", &[], description)?;
        }
        for (name, value) in &procedure.fields {
            xml.element("field", &[("name", name.as_str())], value)?;
        }
        let mut generator = vec![
            ("name", self.program.name.as_str()),
            ("version", self.program.version.as_str()),
        ];
        let uncommitted;
        if let Some(git) = &self.program.git {
            uncommitted = git.uncommitted.to_string();
            generator.push(("commit", git.hash.as_str()));
            generator.push(("date", git.date.as_str()));
            generator.push(("uncommitted", uncommitted.as_str()));
        }
        xml.empty("generator", &generator)?;
        xml.close("metadata")?;

        xml.open("columns", &[])?;
        for column in procedure.columns() {
            let mut attributes = vec![("key", column.key.as_str())];
            if let Some(display) = &column.display {
                attributes.push(("display", display.as_str()));
            }
            if column.actors.is_empty() {
                xml.empty("column", &attributes)?;
            } else {
                xml.open("column", &attributes)?;
                for actor in &column.actors {
                    xml.element("actor", &[], actor)?;
                }
                xml.close("column")?;
            }
        }
        xml.close("columns")?;

        self.intro_rendered = true;
        Ok(())
    }

    fn render_tasks(&mut self) -> Result<(), RenderError> {
        if !self.intro_rendered {
            return Err(sequence_error(OutputFormat::IpvXml));
        }
        let procedure = self.procedure;
        for (task, timing) in procedure.tasks().iter().zip(procedure.timeline()) {
            self.render_task(task, &timing)?;
        }
        Ok(())
    }

    fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = self.markup.inner().clone();
        bytes.extend_from_slice(b"\n</procedure>\n");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_model::ProcedureDefinition;
    use std::path::Path;

    const YAML: &str = r#"
procedure_name: Airlock Egress
fields:
  document_id: EV1-1234
columns:
  - key: IV
    actors: [IV]
  - key: EV1
tasks:
  - title: Prep
    steps:
      - IV:
          - step: "Check <pressure> & temp"
            duration: { minutes: 5 }
            warning: hot
"#;

    fn procedure() -> Procedure {
        let def = ProcedureDefinition::from_yaml(YAML, Path::new("p.yml")).unwrap();
        Procedure::from_definition(&def, "p", Path::new("p.yml")).unwrap()
    }

    #[tokio::test]
    async fn renders_escaped_structure() {
        let procedure = procedure();
        let program = ProgramInfo::default();
        let mut writer = XmlWriter::new(&procedure, &program);
        writer.render_intro().await.unwrap();
        writer.render_tasks().unwrap();
        let xml = String::from_utf8(writer.to_bytes().unwrap()).unwrap();

        assert!(xml.contains(r#"<procedure documentId="EV1-1234" name="Airlock Egress">"#));
        assert!(xml.contains("<actor>IV</actor>"));
        assert!(xml.contains(r#"<step durationSeconds="300">"#));
        assert!(xml.contains("Check &lt;pressure&gt; &amp; temp"));
        assert!(xml.contains(r#"<column key="EV1"/>"#));
        assert!(xml.trim_end().ends_with("</procedure>"));
    }

    #[tokio::test]
    async fn intro_requires_document_id() {
        let mut procedure = procedure();
        procedure.fields.clear();
        let program = ProgramInfo::default();
        let mut writer = XmlWriter::new(&procedure, &program);

        let err = writer.render_intro().await.unwrap_err();
        assert!(matches!(err, RenderError::MissingField { .. }));
    }

    #[test]
    fn tasks_before_intro_is_rejected() {
        let procedure = procedure();
        let program = ProgramInfo::default();
        let mut writer = XmlWriter::new(&procedure, &program);
        assert!(matches!(writer.render_tasks(), Err(RenderError::Sequence { .. })));
    }
}
