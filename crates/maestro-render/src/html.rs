//! Styled HTML backend
//!
//! Content is produced as well-formed XHTML so the HTML transcriber can
//! read it back with an XML reader. The page shell comes from
//! `assets/document.html`; the stylesheet is inlined into it.

use crate::error::RenderError;
use crate::markup::Markup;
use crate::program::ProgramInfo;
use crate::writer::{gap_notice, sequence_error, OutputFormat, ProcedureWriter};
use async_trait::async_trait;
use maestro_model::{Procedure, Step, Task, TaskTiming};
use std::path::PathBuf;

const DOCUMENT_TEMPLATE: &str = include_str!("../assets/document.html");
const DEFAULT_STYLESHEET: &str = include_str!("../assets/static-eva.css");

/// Styled HTML writer
pub struct HtmlWriter<'a> {
    procedure: &'a Procedure,
    program: &'a ProgramInfo,
    stylesheet: Option<PathBuf>,
    css: Option<String>,
    content: Markup<Vec<u8>>,
}

impl<'a> HtmlWriter<'a> {
    /// Create writer; `stylesheet` replaces the built-in CSS
    #[must_use]
    pub fn new(procedure: &'a Procedure, program: &'a ProgramInfo, stylesheet: Option<PathBuf>) -> Self {
        Self {
            procedure,
            program,
            stylesheet,
            css: None,
            content: Markup::indented(Vec::new()),
        }
    }

    fn render_header(&mut self) -> Result<(), RenderError> {
        let procedure = self.procedure;
        let html = &mut self.content;

        html.open("header", &[("class", "procedure-header")])?;
        html.element("h1", &[], &procedure.name)?;
        if let Some(description) = &procedure.description {
            html.element("p", &[("class", "description")], description)?;
        }
        if !procedure.fields.is_empty() {
            html.open("ul", &[("class", "fields")])?;
            for (name, value) in &procedure.fields {
                html.element("li", &[("data-field", name.as_str())], value)?;
            }
            html.close("ul")?;
        }
        if !procedure.columns().is_empty() {
            html.open("ul", &[("class", "columns")])?;
            for column in procedure.columns() {
                let actors = column.actors.join(", ");
                html.element(
                    "li",
                    &[("data-column", column.key.as_str()), ("data-actors", actors.as_str())],
                    column.display_name(),
                )?;
            }
            html.close("ul")?;
        }
        html.close("header")
    }

    fn render_task(&mut self, task: &Task, timing: &TaskTiming) -> Result<(), RenderError> {
        let procedure = self.procedure;
        let html = &mut self.content;
        let start = task.start().map(|s| s.to_clock());

        let mut attributes = vec![("class", "task"), ("data-title", task.title())];
        if let Some(start) = &start {
            attributes.push(("data-start", start.as_str()));
        }
        html.open("section", &attributes)?;

        html.open("header", &[("class", "task-header")])?;
        html.element("span", &[("class", "procedure-name")], &procedure.name)?;
        html.element("h2", &[], task.title())?;
        html.element("span", &[("class", "duration")], &format!("({})", timing.duration))?;
        html.close("header")?;

        if timing.has_gap() {
            html.element("p", &[("class", "gap-warning")], &gap_notice(timing.gap_before))?;
        }

        html.open("table", &[("class", "division-table")])?;
        html.open("thead", &[])?;
        html.open("tr", &[])?;
        for key in task.columns() {
            let header = procedure.column(key).map_or(key.as_str(), |c| c.display_name());
            html.element("th", &[("data-column", key.as_str())], header)?;
        }
        html.close("tr")?;
        html.close("thead")?;

        html.open("tbody", &[])?;
        for division in task.divisions() {
            html.open("tr", &[("class", "division")])?;
            for (column, steps) in division.columns() {
                html.open("td", &[("data-column", column)])?;
                if !steps.is_empty() {
                    html.open("ol", &[("class", "steps")])?;
                    for step in steps {
                        render_step(html, step)?;
                    }
                    html.close("ol")?;
                }
                html.close("td")?;
            }
            html.close("tr")?;
        }
        html.close("tbody")?;
        html.close("table")?;
        html.close("section")
    }

    fn footer(&self) -> Result<String, RenderError> {
        let program = self.program;
        let mut html = Markup::indented(Vec::new());

        html.open("footer", &[("class", "procedure-footer")])?;
        html.open("p", &[("class", "program")])?;
        html.text(&format!("{} {} ", program.full_name, program.version))?;
        if let Some(url) = &program.repo_url {
            html.element("a", &[("href", url.as_str())], url)?;
        }
        html.close("p")?;
        html.element("p", &[("class", "procedure")], &self.procedure.name)?;
        if let Some(git) = &program.git {
            let uncommitted = git.uncommitted.to_string();
            html.element(
                "p",
                &[
                    ("class", "provenance"),
                    ("data-hash", git.hash.as_str()),
                    ("data-date", git.date.as_str()),
                    ("data-uncommitted", uncommitted.as_str()),
                ],
                &format!("Version: {}", git.summary()),
            )?;
        }
        html.close("footer")?;

        String::from_utf8(html.into_inner()).map_err(RenderError::serialization)
    }
}

fn render_step(html: &mut Markup<Vec<u8>>, step: &Step) -> Result<(), RenderError> {
    let duration = step.duration.to_clock();
    html.open("li", &[("class", "step"), ("data-duration", duration.as_str())])?;
    if let Some(title) = &step.title {
        html.element("p", &[("class", "step-title")], title)?;
    }
    for warning in &step.warnings {
        html.element("p", &[("class", "warning")], warning)?;
    }
    for caution in &step.cautions {
        html.element("p", &[("class", "caution")], caution)?;
    }
    for note in &step.notes {
        html.element("p", &[("class", "note")], note)?;
    }
    html.element("p", &[("class", "step-text")], &step.text)?;
    for checkbox in &step.checkboxes {
        html.element("p", &[("class", "checkbox")], checkbox)?;
    }
    html.close("li")
}

/// Substitute `{{name}}` placeholders in one pass over the template
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, value)| value.len()).sum();
    let mut filled = String::with_capacity(template.len() + extra);
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        filled.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            filled.push_str(&rest[open..]);
            return filled;
        };
        let key = after[..close].trim();
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => filled.push_str(value),
            None => filled.push_str(&rest[open..open + close + 4]),
        }
        rest = &after[close + 2..];
    }
    filled.push_str(rest);
    filled
}

#[async_trait]
impl ProcedureWriter for HtmlWriter<'_> {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    async fn render_intro(&mut self) -> Result<(), RenderError> {
        let css = match &self.stylesheet {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| RenderError::io_error(path, e))?,
            None => DEFAULT_STYLESHEET.to_string(),
        };
        self.css = Some(css);
        self.render_header()
    }

    fn render_tasks(&mut self) -> Result<(), RenderError> {
        if self.css.is_none() {
            return Err(sequence_error(OutputFormat::Html));
        }
        let procedure = self.procedure;
        for (task, timing) in procedure.tasks().iter().zip(procedure.timeline()) {
            self.render_task(task, &timing)?;
        }
        Ok(())
    }

    fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let content =
            std::str::from_utf8(self.content.inner()).map_err(RenderError::serialization)?;
        let title = format!("{} - {}", self.procedure.name, self.program.full_name);
        let title = quick_xml::escape::escape(&title);
        let footer = self.footer()?;

        let document = fill_template(
            DOCUMENT_TEMPLATE,
            &[
                ("title", title.as_ref()),
                ("css", self.css.as_deref().unwrap_or_default()),
                ("content", content),
                ("footer", footer.as_str()),
            ],
        );
        Ok(document.into_bytes())
    }
}
