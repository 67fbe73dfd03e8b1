//! Styled HTML transcriber
//!
//! Reads the structure the HTML writer emits: `section.task` per task,
//! `tr.division` per division, `td[data-column]` per column and
//! `li.step[data-duration]` per step, with the procedure header carrying
//! name, fields and columns. Presentation (headings inside tasks, gap
//! warnings, durations, footer) is ignored.

use crate::assemble::Assembler;
use crate::error::TranscribeError;
use crate::markup::{self, attribute, has_class, local_name};
use crate::registry::Transcriber;
use maestro_model::{ColumnDefinition, ProcedureDefinition, Step, TimeSpan};
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Transcriber for `.html` / `.htm`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTranscriber;

impl Transcriber for HtmlTranscriber {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn transcribe(&self, source: &[u8], origin: &Path) -> Result<ProcedureDefinition, TranscribeError> {
        let text = std::str::from_utf8(source)
            .map_err(|e| TranscribeError::structural(origin, format!("not UTF-8: {e}")))?;
        let text = markup::strip_raw_text(&markup::strip_raw_text(text, "style"), "script");

        let mut reader = markup::reader(&text);
        let mut document = HtmlDocument::new(origin);
        loop {
            let event = reader.read_event().map_err(|e| {
                TranscribeError::structural(
                    origin,
                    format!("malformed markup near byte {}: {e}", reader.buffer_position()),
                )
            })?;
            match event {
                Event::Start(start) => document.open(&start)?,
                Event::Empty(start) => {
                    document.open(&start)?;
                    document.close(&local_name(start.local_name().as_ref()))?;
                }
                Event::End(end) => document.close(&local_name(end.local_name().as_ref()))?,
                Event::Text(text) => document.text(&markup::text(&text)),
                Event::CData(data) => document.text(&String::from_utf8_lossy(&data)),
                Event::Eof => break,
                _ => {}
            }
        }
        document.assembler.finish()
    }
}

/// Element whose text is being collected
enum Slot {
    ProcedureName,
    Description,
    Field(String),
    ColumnDisplay(usize),
    TaskTitle,
    StepTitle,
    Warning,
    Caution,
    Note,
    StepText,
    Checkbox,
}

struct HtmlDocument<'a> {
    origin: &'a Path,
    assembler: Assembler,
    capture: Option<(String, Slot, String)>,
    in_header: bool,
    in_step: bool,
}

impl<'a> HtmlDocument<'a> {
    fn new(origin: &'a Path) -> Self {
        Self {
            origin,
            assembler: Assembler::new(origin),
            capture: None,
            in_header: false,
            in_step: false,
        }
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), TranscribeError> {
        let name = local_name(start.local_name().as_ref());
        let class = attribute(start, "class", self.origin)?;
        let class = class.as_deref();

        let slot = match name.as_str() {
            "header" if has_class(class, "procedure-header") => {
                self.in_header = true;
                None
            }
            "h1" if self.in_header => Some(Slot::ProcedureName),
            "p" if self.in_header && has_class(class, "description") => Some(Slot::Description),
            "li" if self.in_header => self.header_item(start)?,
            "section" if has_class(class, "task") => {
                let title = attribute(start, "data-title", self.origin)?.unwrap_or_default();
                let begins = self.clock(attribute(start, "data-start", self.origin)?)?;
                self.assembler.begin_task(title, begins)?;
                None
            }
            "h2" if self.assembler.has_task() => Some(Slot::TaskTitle),
            "th" => {
                if let Some(key) = attribute(start, "data-column", self.origin)? {
                    self.assembler.declare_task_column(&key)?;
                }
                None
            }
            "tr" if has_class(class, "division") => {
                self.assembler.begin_division()?;
                None
            }
            "td" => {
                let key = attribute(start, "data-column", self.origin)?
                    .ok_or_else(|| self.assembler.structural("division cell without data-column"))?;
                self.assembler.begin_column(&key)?;
                None
            }
            "li" if has_class(class, "step") => {
                let duration = self.clock(attribute(start, "data-duration", self.origin)?)?;
                self.assembler
                    .begin_step(Step::default().with_duration(duration.unwrap_or_default()))?;
                self.in_step = true;
                None
            }
            "p" if self.in_step => step_slot(class),
            _ => None,
        };

        if let Some(slot) = slot {
            self.capture = Some((name, slot, String::new()));
        }
        Ok(())
    }

    fn header_item(&mut self, start: &BytesStart<'_>) -> Result<Option<Slot>, TranscribeError> {
        if let Some(field) = attribute(start, "data-field", self.origin)? {
            return Ok(Some(Slot::Field(field)));
        }
        let Some(key) = attribute(start, "data-column", self.origin)? else {
            return Ok(None);
        };
        let actors = attribute(start, "data-actors", self.origin)?
            .map(|actors| {
                actors
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        self.assembler.columns.push(ColumnDefinition {
            key,
            display: None,
            actors,
        });
        Ok(Some(Slot::ColumnDisplay(self.assembler.columns.len() - 1)))
    }

    fn clock(&self, value: Option<String>) -> Result<Option<TimeSpan>, TranscribeError> {
        value
            .map(|value| {
                TimeSpan::parse_clock(&value)
                    .ok_or_else(|| self.assembler.structural(format!("bad clock value '{value}'")))
            })
            .transpose()
    }

    fn text(&mut self, text: &str) {
        if let Some((_, _, collected)) = self.capture.as_mut() {
            if !collected.is_empty() {
                collected.push(' ');
            }
            collected.push_str(text);
        }
    }

    fn close(&mut self, name: &str) -> Result<(), TranscribeError> {
        if self.capture.as_ref().is_some_and(|(element, _, _)| element == name) {
            if let Some((_, slot, text)) = self.capture.take() {
                self.apply(slot, text)?;
            }
            return Ok(());
        }

        match name {
            "header" => self.in_header = false,
            "li" if self.in_step => {
                self.in_step = false;
                self.assembler.end_step()?;
            }
            "td" => self.assembler.end_column()?,
            "tr" => self.assembler.end_division()?,
            "section" => self.assembler.end_task()?,
            _ => {}
        }
        Ok(())
    }

    fn apply(&mut self, slot: Slot, text: String) -> Result<(), TranscribeError> {
        let assembler = &mut self.assembler;
        match slot {
            Slot::ProcedureName => assembler.name = text,
            Slot::Description => assembler.description = Some(text),
            Slot::Field(name) => {
                assembler.fields.insert(name, text);
            }
            Slot::ColumnDisplay(index) => {
                if let Some(column) = assembler.columns.get_mut(index) {
                    if text != column.key {
                        column.display = Some(text);
                    }
                }
            }
            Slot::TaskTitle => {
                if let Some(title) = assembler.task_title_mut() {
                    if title.is_empty() {
                        *title = text;
                    }
                }
            }
            Slot::StepTitle => assembler.step_mut()?.title = Some(text),
            Slot::Warning => assembler.step_mut()?.warnings.push(text),
            Slot::Caution => assembler.step_mut()?.cautions.push(text),
            Slot::Note => assembler.step_mut()?.notes.push(text),
            Slot::StepText => assembler.step_mut()?.text = text,
            Slot::Checkbox => assembler.step_mut()?.checkboxes.push(text),
        }
        Ok(())
    }
}

fn step_slot(class: Option<&str>) -> Option<Slot> {
    [
        ("step-title", Slot::StepTitle),
        ("warning", Slot::Warning),
        ("caution", Slot::Caution),
        ("note", Slot::Note),
        ("step-text", Slot::StepText),
        ("checkbox", Slot::Checkbox),
    ]
    .into_iter()
    .find(|(wanted, _)| has_class(class, wanted))
    .map(|(_, slot)| slot)
}
