//! Interchange XML transcriber
//!
//! Accepts the `<procedure>` document written by the XML backend, either
//! bare (`.xml`) or as the first `.xml` entry of a zip archive (`.zip`).

use crate::assemble::Assembler;
use crate::error::TranscribeError;
use crate::markup::{self, attribute, local_name};
use crate::registry::Transcriber;
use maestro_model::{ColumnDefinition, ProcedureDefinition, Step, TimeSpan, DOCUMENT_ID_FIELD};
use quick_xml::events::{BytesStart, Event};
use std::io::{Cursor, Read};
use std::path::Path;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Transcriber for `.xml` and `.zip`
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlTranscriber;

impl Transcriber for XmlTranscriber {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn extensions(&self) -> &[&str] {
        &["xml", "zip"]
    }

    fn transcribe(&self, source: &[u8], origin: &Path) -> Result<ProcedureDefinition, TranscribeError> {
        if source.starts_with(ZIP_MAGIC) {
            let document = first_xml_entry(source, origin)?;
            return parse_document(&document, origin);
        }
        let text = std::str::from_utf8(source)
            .map_err(|e| TranscribeError::structural(origin, format!("not UTF-8: {e}")))?;
        parse_document(text, origin)
    }
}

fn first_xml_entry(archive: &[u8], origin: &Path) -> Result<String, TranscribeError> {
    let bad_archive = |e: zip::result::ZipError| TranscribeError::structural(origin, format!("bad archive: {e}"));
    let mut archive = zip::ZipArchive::new(Cursor::new(archive)).map_err(bad_archive)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(bad_archive)?;
        if !entry.name().to_ascii_lowercase().ends_with(".xml") {
            continue;
        }
        let name = entry.name().to_string();
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| TranscribeError::structural(origin, format!("cannot read {name}: {e}")))?;
        tracing::debug!(origin = %origin.display(), entry = %name, "reading archived procedure");
        return Ok(content);
    }
    Err(TranscribeError::structural(origin, "archive contains no .xml entry"))
}

fn parse_document(text: &str, origin: &Path) -> Result<ProcedureDefinition, TranscribeError> {
    let mut reader = markup::reader(text);
    let mut document = XmlDocument {
        origin,
        assembler: Assembler::new(origin),
        path: Vec::new(),
        text: String::new(),
        field: None,
        seen_root: false,
    };

    loop {
        let event = reader.read_event().map_err(|e| {
            TranscribeError::structural(
                origin,
                format!("malformed XML near byte {}: {e}", reader.buffer_position()),
            )
        })?;
        match event {
            Event::Start(start) => document.open(&start)?,
            Event::Empty(start) => {
                document.open(&start)?;
                document.close()?;
            }
            Event::End(_) => document.close()?,
            Event::Text(text) => document.text.push_str(&markup::text(&text)),
            Event::CData(data) => document.text.push_str(&String::from_utf8_lossy(&data)),
            Event::Eof => break,
            _ => {}
        }
    }

    if !document.seen_root {
        return Err(TranscribeError::structural(origin, "no <procedure> root element"));
    }
    document.assembler.finish()
}

struct XmlDocument<'a> {
    origin: &'a Path,
    assembler: Assembler,
    /// Open element names, outermost first
    path: Vec<String>,
    text: String,
    field: Option<String>,
    seen_root: bool,
}

impl XmlDocument<'_> {
    fn parent(&self) -> Option<String> {
        self.path.last().cloned()
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), TranscribeError> {
        let name = local_name(start.local_name().as_ref());
        self.text.clear();

        let parent = self.parent();
        match (parent.as_deref(), name.as_str()) {
            (None, "procedure") => {
                self.seen_root = true;
                self.assembler.name = attribute(start, "name", self.origin)?.unwrap_or_default();
                if let Some(id) = attribute(start, "documentId", self.origin)? {
                    self.assembler.fields.insert(DOCUMENT_ID_FIELD.to_string(), id);
                }
            }
            (None, other) => {
                return Err(self.assembler.structural(format!(
                    "expected <procedure> root element, found <{other}>"
                )));
            }
            (Some("metadata"), "field") => {
                self.field = attribute(start, "name", self.origin)?;
            }
            (Some("columns"), "column") => {
                let key = self.required(start, "key")?;
                let display = attribute(start, "display", self.origin)?;
                self.assembler.columns.push(ColumnDefinition {
                    key,
                    display,
                    actors: Vec::new(),
                });
            }
            (Some("procedure"), "task") => {
                let title = self.required(start, "title")?;
                let begins = attribute(start, "start", self.origin)?
                    .map(|value| self.clock(&value))
                    .transpose()?;
                self.assembler.begin_task(title, begins)?;
            }
            (Some("task"), "division") => self.assembler.begin_division()?,
            (Some("division"), "column") => {
                let key = self.required(start, "key")?;
                self.assembler.begin_column(&key)?;
            }
            (Some("column"), "step") => {
                let seconds = attribute(start, "durationSeconds", self.origin)?
                    .map(|value| {
                        value.trim().parse::<u64>().map_err(|_| {
                            self.assembler
                                .structural(format!("bad durationSeconds '{value}'"))
                        })
                    })
                    .transpose()?
                    .unwrap_or_default();
                let mut step = Step::default().with_duration(TimeSpan::from_seconds(seconds));
                step.title = attribute(start, "title", self.origin)?;
                self.assembler.begin_step(step)?;
            }
            _ => {}
        }

        self.path.push(name);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TranscribeError> {
        let Some(name) = self.path.pop() else {
            return Ok(());
        };
        let text = std::mem::take(&mut self.text).trim().to_string();

        let parent = self.parent();
        match (parent.as_deref(), name.as_str()) {
            (Some("metadata"), "description") => self.assembler.description = Some(text),
            (Some("metadata"), "field") => {
                if let Some(field) = self.field.take() {
                    self.assembler.fields.insert(field, text);
                }
            }
            (Some("column"), "actor") if self.path.iter().any(|p| p == "columns") => {
                if let Some(column) = self.assembler.columns.last_mut() {
                    column.actors.push(text);
                }
            }
            (Some("step"), "text") => self.assembler.step_mut()?.text = text,
            (Some("step"), "warning") => self.assembler.step_mut()?.warnings.push(text),
            (Some("step"), "caution") => self.assembler.step_mut()?.cautions.push(text),
            (Some("step"), "note") => self.assembler.step_mut()?.notes.push(text),
            (Some("step"), "checkbox") => self.assembler.step_mut()?.checkboxes.push(text),
            (Some("column"), "step") => self.assembler.end_step()?,
            (Some("division"), "column") => self.assembler.end_column()?,
            (Some("task"), "division") => self.assembler.end_division()?,
            (Some("procedure"), "task") => self.assembler.end_task()?,
            _ => {}
        }
        Ok(())
    }

    fn required(&self, start: &BytesStart<'_>, name: &str) -> Result<String, TranscribeError> {
        let element = local_name(start.local_name().as_ref());
        attribute(start, name, self.origin)?
            .ok_or_else(|| self.assembler.structural(format!("<{element}> without '{name}'")))
    }

    fn clock(&self, value: &str) -> Result<TimeSpan, TranscribeError> {
        TimeSpan::parse_clock(value)
            .ok_or_else(|| self.assembler.structural(format!("bad clock value '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_model::{StepDefinition, TaskEntry};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<procedure documentId="EV1-1234" name="Airlock Egress">
  <metadata>
    <description>Crew egress</description>
    <field name="document_id">EV1-1234</field>
    <field name="revision">B</field>
    <generator name="maestro" version="0.1.0"/>
  </metadata>
  <columns>
    <column key="IV" display="IV/SSRMS"><actor>IV</actor></column>
    <column key="EV1"/>
  </columns>
  <task title="Prep" duration="00:10:00" start="00:00:00">
    <division>
      <column key="IV">
        <step durationSeconds="300" title="Setup"><text>Configure &amp; verify</text><note>twice</note></step>
      </column>
      <column key="EV1"/>
    </division>
    <division>
      <column key="IV"/>
      <column key="EV1"><step durationSeconds="0"><text>Don suit</text></step></column>
    </division>
  </task>
</procedure>
"#;

    #[test]
    fn reads_metadata_columns_and_tasks() {
        let definition = XmlTranscriber
            .transcribe(DOCUMENT.as_bytes(), Path::new("EV1-1234.xml"))
            .unwrap();

        assert_eq!(definition.procedure_name, "Airlock Egress");
        assert_eq!(definition.description.as_deref(), Some("Crew egress"));
        assert_eq!(definition.fields["document_id"], "EV1-1234");
        assert_eq!(definition.fields["revision"], "B");
        assert_eq!(definition.columns[0].actors, vec!["IV"]);
        assert_eq!(definition.columns[1].display, None);

        let TaskEntry::Inline(task) = &definition.tasks[0] else {
            panic!("expected inline task");
        };
        assert_eq!(task.start, Some(TimeSpan::ZERO));
        assert_eq!(task.columns, vec!["IV", "EV1"]);
        assert_eq!(task.steps.len(), 2);

        let StepDefinition::Detailed(setup) = &task.steps[0]["IV"][0] else {
            panic!("expected detailed step");
        };
        assert_eq!(setup.step, "Configure & verify");
        assert_eq!(setup.title.as_deref(), Some("Setup"));
        assert_eq!(setup.duration, TimeSpan::from_minutes(5));
        assert_eq!(setup.note, vec!["twice"]);
        assert_eq!(
            task.steps[1]["EV1"],
            vec![StepDefinition::Text("Don suit".to_string())]
        );
    }

    #[test]
    fn reads_first_xml_entry_of_archive() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        zip.start_file("readme.txt", options).unwrap();
        zip.write_all(b"not a procedure").unwrap();
        zip.start_file("EV1-1234/EV1-1234.xml", options).unwrap();
        zip.write_all(DOCUMENT.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let definition = XmlTranscriber
            .transcribe(&bytes, Path::new("EV1-1234.zip"))
            .unwrap();
        assert_eq!(definition.tasks.len(), 1);
    }

    #[test]
    fn archive_without_xml_is_structural() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("readme.txt", zip::write::FileOptions::default()).unwrap();
        zip.write_all(b"nothing here").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = XmlTranscriber
            .transcribe(&bytes, Path::new("empty.zip"))
            .unwrap_err();
        assert!(err.to_string().contains("no .xml entry"));
    }

    #[test]
    fn wrong_root_is_structural() {
        let err = XmlTranscriber
            .transcribe(b"<document/>", Path::new("other.xml"))
            .unwrap_err();
        assert!(err.to_string().contains("<procedure>"));
    }

    #[test]
    fn step_outside_column_is_structural() {
        let document = r#"<procedure name="P"><task title="T"><division><step durationSeconds="1"><text>x</text></step></division></task></procedure>"#;
        let err = XmlTranscriber
            .transcribe(document.as_bytes(), Path::new("p.xml"))
            .unwrap_err();
        assert!(matches!(err, TranscribeError::Structural { .. }));
        assert!(err.to_string().contains("p.xml"));
    }
}
