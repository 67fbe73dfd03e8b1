//! Markdown transcriber
//!
//! Front matter carries the procedure metadata as YAML. The body maps
//! heading levels onto structure: `##` task, `###` division, `####` column.
//! Steps are top-level list items, optionally prefixed with a
//! `[HH:MM:SS]` duration; nested `LABEL: value` items carry step details.
//! A `Start: HH:MM:SS` paragraph sets the task's scheduled start.

use crate::assemble::Assembler;
use crate::error::TranscribeError;
use crate::registry::Transcriber;
use maestro_model::{ProcedureDefinition, Step, TimeSpan};
use pulldown_cmark::{Event, HeadingLevel, Parser as MdParser, Tag, TagEnd};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Transcriber for `.md` / `.markdown`
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTranscriber;

impl MarkdownTranscriber {
    /// Split `---` delimited YAML front matter from the body
    fn extract_frontmatter(content: &str) -> (Option<&str>, &str) {
        if let Some(rest) = content.strip_prefix("---") {
            if let Some(end) = rest.find("\n---") {
                let body = &rest[end + 4..];
                return (Some(&rest[..end]), body.trim_start_matches(['\r', '\n']));
            }
        }
        (None, content)
    }
}

impl Transcriber for MarkdownTranscriber {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn transcribe(&self, source: &[u8], origin: &Path) -> Result<ProcedureDefinition, TranscribeError> {
        let content = std::str::from_utf8(source)
            .map_err(|e| TranscribeError::structural(origin, format!("not UTF-8: {e}")))?;
        let (frontmatter, body) = Self::extract_frontmatter(content);

        let mut assembler = Assembler::new(origin);
        let mut named_by_frontmatter = false;
        if let Some(yaml) = frontmatter {
            let metadata = ProcedureDefinition::from_yaml(yaml, origin)?;
            if !metadata.tasks.is_empty() {
                tracing::warn!(
                    origin = %origin.display(),
                    "ignoring tasks listed in front matter; the body defines tasks"
                );
            }
            assembler.name = metadata.procedure_name;
            assembler.description = metadata.description;
            assembler.fields = metadata.fields;
            assembler.columns = metadata.columns;
            named_by_frontmatter = true;
        }

        let mut body_reader = BodyReader {
            assembler,
            named_by_frontmatter,
            heading: None,
            paragraph: None,
            list_depth: 0,
            item: String::new(),
            step_started: false,
        };
        for event in MdParser::new(body) {
            body_reader.event(event)?;
        }
        body_reader.assembler.finish()
    }
}

struct BodyReader {
    assembler: Assembler,
    named_by_frontmatter: bool,
    heading: Option<(HeadingLevel, String)>,
    paragraph: Option<String>,
    list_depth: usize,
    item: String,
    step_started: bool,
}

impl BodyReader {
    fn event(&mut self, event: Event<'_>) -> Result<(), TranscribeError> {
        match event {
            Event::Start(Tag::Heading { level, .. }) => self.heading = Some((level, String::new())),
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = self.heading.take() {
                    self.on_heading(level, text.trim())?;
                }
            }
            Event::Start(Tag::Paragraph) if self.list_depth == 0 => self.paragraph = Some(String::new()),
            Event::End(TagEnd::Paragraph) if self.list_depth == 0 => {
                if let Some(text) = self.paragraph.take() {
                    self.on_paragraph(text.trim())?;
                }
            }
            Event::Start(Tag::List(_)) => {
                if self.list_depth == 1 {
                    self.start_step()?;
                }
                self.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => self.list_depth = self.list_depth.saturating_sub(1),
            Event::Start(Tag::Item) => self.item.clear(),
            Event::End(TagEnd::Item) => self.end_item()?,
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak | Event::HardBreak => self.push_text(" "),
            _ => {}
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, heading)) = self.heading.as_mut() {
            heading.push_str(text);
        } else if self.list_depth > 0 {
            self.item.push_str(text);
        } else if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push_str(text);
        }
    }

    fn on_heading(&mut self, level: HeadingLevel, text: &str) -> Result<(), TranscribeError> {
        match level {
            HeadingLevel::H1 => {
                if !self.named_by_frontmatter {
                    self.assembler.name = text.to_string();
                }
            }
            HeadingLevel::H2 => self.assembler.begin_task(text, None)?,
            HeadingLevel::H3 => self.assembler.begin_division()?,
            HeadingLevel::H4 => self.assembler.begin_column(text)?,
            _ => {}
        }
        Ok(())
    }

    fn on_paragraph(&mut self, text: &str) -> Result<(), TranscribeError> {
        let Some(value) = text.strip_prefix("Start:") else {
            return Ok(());
        };
        if !self.assembler.has_task() {
            return Ok(());
        }
        let start = TimeSpan::parse_clock(value)
            .ok_or_else(|| self.assembler.structural(format!("bad start time '{}'", value.trim())))?;
        self.assembler.set_task_start(start)
    }

    /// Turn the pending top-level item text into the open step
    fn start_step(&mut self) -> Result<(), TranscribeError> {
        if self.step_started {
            return Ok(());
        }
        let line = std::mem::take(&mut self.item);
        self.assembler.begin_step(parse_step_line(line.trim()))?;
        self.step_started = true;
        Ok(())
    }

    fn end_item(&mut self) -> Result<(), TranscribeError> {
        match self.list_depth {
            1 => {
                self.start_step()?;
                self.assembler.end_step()?;
                self.step_started = false;
            }
            2 => {
                let line = std::mem::take(&mut self.item);
                let (label, value) = line
                    .split_once(':')
                    .map(|(label, value)| (label.trim().to_ascii_uppercase(), value.trim().to_string()))
                    .ok_or_else(|| self.assembler.structural(format!("step detail without a label: '{line}'")))?;
                let step = self.assembler.step_mut()?;
                match label.as_str() {
                    "TITLE" => step.title = Some(value),
                    "WARNING" => step.warnings.push(value),
                    "CAUTION" => step.cautions.push(value),
                    "NOTE" => step.notes.push(value),
                    "CHECKBOX" => step.checkboxes.push(value),
                    other => {
                        return Err(self
                            .assembler
                            .structural(format!("unknown step detail label '{other}'")));
                    }
                }
            }
            _ => self.item.clear(),
        }
        Ok(())
    }
}

fn step_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\[(\d+:\d{2}(?::\d{2})?)\]\s*(.*)$").unwrap_or_else(|e| unreachable!("{e}"))
    })
}

/// `[00:05:00] text` or plain `text`
fn parse_step_line(line: &str) -> Step {
    if let Some(captures) = step_line_pattern().captures(line) {
        if let Some(duration) = TimeSpan::parse_clock(&captures[1]) {
            return Step::new(captures[2].trim()).with_duration(duration);
        }
    }
    Step::new(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_model::{StepDefinition, TaskEntry};
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = r#"---
procedure_name: Airlock Egress
fields:
  document_id: EV1-1234
columns:
  - key: IV
  - key: EV1
tasks: []
---

# Airlock Egress

<!-- maestro 0.1.0 -->

## Egress

Start: 00:15:00

Duration: 00:03

> 5 minutes wasted before this activity

### Division 1

#### IV

#### EV1

- [00:03:00] Open `hatch`
  - WARNING: Sharp edge
  - CHECKBOX: Hatch open
- Exit

### Division 2

#### IV

- [00:00:30] Close hatch

#### EV1
"#;

    #[test]
    fn reads_frontmatter_and_body() {
        let definition = MarkdownTranscriber
            .transcribe(DOCUMENT.as_bytes(), Path::new("egress.md"))
            .unwrap();

        assert_eq!(definition.procedure_name, "Airlock Egress");
        assert_eq!(definition.fields["document_id"], "EV1-1234");
        assert_eq!(definition.columns.len(), 2);

        let TaskEntry::Inline(task) = &definition.tasks[0] else {
            panic!("expected inline task");
        };
        assert_eq!(task.title, "Egress");
        assert_eq!(task.start, Some(TimeSpan::from_minutes(15)));
        assert_eq!(task.columns, vec!["IV", "EV1"]);
        assert_eq!(task.steps.len(), 2);
        assert!(task.steps[0]["IV"].is_empty());
        assert!(task.steps[1]["EV1"].is_empty());

        let first = &task.steps[0]["EV1"];
        let StepDefinition::Detailed(open) = &first[0] else {
            panic!("expected detailed step");
        };
        assert_eq!(open.step, "Open hatch");
        assert_eq!(open.duration, TimeSpan::from_minutes(3));
        assert_eq!(open.warning, vec!["Sharp edge"]);
        assert_eq!(open.checkboxes, vec!["Hatch open"]);
        assert_eq!(first[1], StepDefinition::Text("Exit".to_string()));

        let StepDefinition::Detailed(close) = &task.steps[1]["IV"][0] else {
            panic!("expected detailed step");
        };
        assert_eq!(close.duration, TimeSpan::from_seconds(30));
    }

    #[test]
    fn name_from_heading_without_frontmatter() {
        let body = "# Quick Check\n\n## Look\n\n### Division 1\n\n#### IV\n\n- Look around\n";
        let definition = MarkdownTranscriber
            .transcribe(body.as_bytes(), Path::new("quick.md"))
            .unwrap();
        assert_eq!(definition.procedure_name, "Quick Check");
        assert_eq!(definition.tasks.len(), 1);
    }

    #[test]
    fn step_before_any_column_is_structural() {
        let body = "# P\n\n## Task\n\n- stray step\n";
        let err = MarkdownTranscriber
            .transcribe(body.as_bytes(), Path::new("stray.md"))
            .unwrap_err();
        assert!(matches!(err, TranscribeError::Structural { .. }));
        assert!(err.to_string().contains("stray.md"));
    }

    #[test]
    fn unknown_detail_label_is_structural() {
        let body = "# P\n\n## T\n\n### Division 1\n\n#### IV\n\n- step\n  - HINT: nope\n";
        let err = MarkdownTranscriber
            .transcribe(body.as_bytes(), Path::new("p.md"))
            .unwrap_err();
        assert!(err.to_string().contains("HINT"));
    }

    #[test]
    fn step_line_duration_prefix() {
        assert_eq!(
            parse_step_line("[01:02:03] Pressurize"),
            Step::new("Pressurize").with_duration(TimeSpan::from_hms(1, 2, 3))
        );
        assert_eq!(
            parse_step_line("[00:05] Vent"),
            Step::new("Vent").with_duration(TimeSpan::from_minutes(5))
        );
        assert_eq!(parse_step_line("No prefix"), Step::new("No prefix"));
    }
}
