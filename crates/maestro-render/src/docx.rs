//! Paginated DOCX backend
//!
//! Builds `word/document.xml` with the event writer and packages it with a
//! footer part into the OOXML zip container. The two variants differ only in
//! their [`PageGeometry`].

use crate::error::RenderError;
use crate::geometry::{Orientation, PageGeometry};
use crate::markup::Markup;
use crate::program::ProgramInfo;
use crate::writer::{gap_notice, sequence_error, OutputFormat, ProcedureWriter};
use async_trait::async_trait;
use maestro_model::{Procedure, Step, Task, TaskTiming};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rIdFooter1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>
</Relationships>"#;

/// DOCX writer for one paginated variant
pub struct DocxWriter<'a> {
    procedure: &'a Procedure,
    program: &'a ProgramInfo,
    format: OutputFormat,
    geometry: PageGeometry,
    body: Vec<u8>,
    intro_rendered: bool,
}

impl<'a> DocxWriter<'a> {
    /// Create writer with the given page layout
    #[must_use]
    pub fn new(
        procedure: &'a Procedure,
        program: &'a ProgramInfo,
        format: OutputFormat,
        geometry: PageGeometry,
    ) -> Self {
        Self {
            procedure,
            program,
            format,
            geometry,
            body: Vec::new(),
            intro_rendered: false,
        }
    }

    /// Page layout in use
    #[must_use]
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn render_task(
        &self,
        xml: &mut Markup<&mut Vec<u8>>,
        task: &Task,
        timing: &TaskTiming,
    ) -> Result<(), RenderError> {
        let tab = self.geometry.right_tab_position.to_string();

        // header: "<procedure> - <task><TAB>(HH:MM)"
        xml.open("w:p", &[])?;
        xml.open("w:pPr", &[])?;
        xml.open("w:tabs", &[])?;
        xml.empty("w:tab", &[("w:val", "right"), ("w:pos", tab.as_str())])?;
        xml.close("w:tabs")?;
        xml.close("w:pPr")?;
        run(xml, &format!("{} - {}", self.procedure.name, task.title()), true)?;
        xml.open("w:r", &[])?;
        xml.empty("w:tab", &[])?;
        text(xml, &format!("({})", timing.duration))?;
        xml.close("w:r")?;
        xml.close("w:p")?;

        if timing.has_gap() {
            paragraph(xml, &gap_notice(timing.gap_before), true)?;
        }

        let columns = task.columns();
        let width = self.geometry.content_width();
        let column_width = (width / u32::try_from(columns.len().max(1)).unwrap_or(1)).to_string();
        let table_width = width.to_string();

        xml.open("w:tbl", &[])?;
        xml.open("w:tblPr", &[])?;
        xml.empty("w:tblW", &[("w:w", table_width.as_str()), ("w:type", "dxa")])?;
        xml.open("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            xml.empty(
                side,
                &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "000000")],
            )?;
        }
        xml.close("w:tblBorders")?;
        xml.close("w:tblPr")?;
        xml.open("w:tblGrid", &[])?;
        for _ in columns {
            xml.empty("w:gridCol", &[("w:w", column_width.as_str())])?;
        }
        xml.close("w:tblGrid")?;

        xml.open("w:tr", &[])?;
        for key in columns {
            let header = self.procedure.column(key).map_or(key.as_str(), |c| c.display_name());
            cell_open(xml, &column_width)?;
            paragraph(xml, header, true)?;
            xml.close("w:tc")?;
        }
        xml.close("w:tr")?;

        let mut numbers = vec![0_usize; columns.len()];
        for division in task.divisions() {
            xml.open("w:tr", &[])?;
            for (position, (_, steps)) in division.columns().enumerate() {
                cell_open(xml, &column_width)?;
                if steps.is_empty() {
                    // a cell needs at least one paragraph
                    xml.empty("w:p", &[])?;
                }
                for step in steps {
                    numbers[position] += 1;
                    render_step(xml, numbers[position], step)?;
                }
                xml.close("w:tc")?;
            }
            xml.close("w:tr")?;
        }
        xml.close("w:tbl")?;
        xml.empty("w:p", &[])
    }

    fn document_xml(&self) -> Result<Vec<u8>, RenderError> {
        let (width, height) = self.geometry.page_size();
        let (width, height) = (width.to_string(), height.to_string());
        let margins = self.geometry.margins;
        let (top, right, bottom, left) = (
            margins.top.to_string(),
            margins.right.to_string(),
            margins.bottom.to_string(),
            margins.left.to_string(),
        );
        let orientation = match self.geometry.orientation {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        };

        let mut xml = Markup::new(Vec::new());
        xml.declaration()?;
        xml.open("w:document", &[("xmlns:w", WORDML_NS), ("xmlns:r", RELATIONSHIPS_NS)])?;
        xml.open("w:body", &[])?;
        xml.raw(&self.body)?;
        xml.open("w:sectPr", &[])?;
        xml.empty("w:footerReference", &[("w:type", "default"), ("r:id", "rIdFooter1")])?;
        xml.empty(
            "w:pgSz",
            &[("w:w", width.as_str()), ("w:h", height.as_str()), ("w:orient", orientation)],
        )?;
        xml.empty(
            "w:pgMar",
            &[
                ("w:top", top.as_str()),
                ("w:right", right.as_str()),
                ("w:bottom", bottom.as_str()),
                ("w:left", left.as_str()),
            ],
        )?;
        xml.close("w:sectPr")?;
        xml.close("w:body")?;
        xml.close("w:document")?;
        Ok(xml.into_inner())
    }

    fn footer_xml(&self) -> Result<Vec<u8>, RenderError> {
        let mut xml = Markup::new(Vec::new());
        xml.declaration()?;
        xml.open("w:ftr", &[("xmlns:w", WORDML_NS), ("xmlns:r", RELATIONSHIPS_NS)])?;
        paragraph(&mut xml, &self.program.footer_line(&self.procedure.name), false)?;
        xml.close("w:ftr")?;
        Ok(xml.into_inner())
    }
}

#[async_trait]
impl ProcedureWriter for DocxWriter<'_> {
    fn format(&self) -> OutputFormat {
        self.format
    }

    async fn render_intro(&mut self) -> Result<(), RenderError> {
        let procedure = self.procedure;
        let mut xml = Markup::new(&mut self.body);

        xml.open("w:p", &[])?;
        xml.open("w:r", &[])?;
        xml.open("w:rPr", &[])?;
        xml.empty("w:b", &[])?;
        xml.empty("w:sz", &[("w:val", "32")])?;
        xml.close("w:rPr")?;
        text(&mut xml, &procedure.name)?;
        xml.close("w:r")?;
        xml.close("w:p")?;

        if let Some(description) = &procedure.description {
            paragraph(&mut xml, description, false)?;
        }
        for (name, value) in &procedure.fields {
            paragraph(&mut xml, &format!("{name}: {value}"), false)?;
        }
        let total = procedure.tasks().total_duration();
        paragraph(&mut xml, &format!("Total duration: {total}"), false)?;
        xml.empty("w:p", &[])?;

        self.intro_rendered = true;
        Ok(())
    }

    fn render_tasks(&mut self) -> Result<(), RenderError> {
        if !self.intro_rendered {
            return Err(sequence_error(self.format));
        }
        let mut body = std::mem::take(&mut self.body);
        let result = {
            let mut xml = Markup::new(&mut body);
            self.procedure
                .tasks()
                .iter()
                .zip(self.procedure.timeline())
                .try_for_each(|(task, timing)| self.render_task(&mut xml, task, &timing))
        };
        self.body = body;
        result
    }

    fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let parts: [(&str, Vec<u8>); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes().to_vec()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes().to_vec()),
            ("word/document.xml", self.document_xml()?),
            ("word/footer1.xml", self.footer_xml()?),
        ];
        for (name, content) in parts {
            zip.start_file(name, options).map_err(RenderError::archive)?;
            zip.write_all(&content).map_err(RenderError::archive)?;
        }
        let cursor = zip.finish().map_err(RenderError::archive)?;
        Ok(cursor.into_inner())
    }
}

fn cell_open(xml: &mut Markup<impl Write>, width: &str) -> Result<(), RenderError> {
    xml.open("w:tc", &[])?;
    xml.open("w:tcPr", &[])?;
    xml.empty("w:tcW", &[("w:w", width), ("w:type", "dxa")])?;
    xml.close("w:tcPr")
}

fn render_step(xml: &mut Markup<impl Write>, number: usize, step: &Step) -> Result<(), RenderError> {
    if let Some(title) = &step.title {
        paragraph(xml, title, true)?;
    }
    for (label, entries) in [
        ("WARNING", &step.warnings),
        ("CAUTION", &step.cautions),
        ("NOTE", &step.notes),
    ] {
        for entry in entries {
            xml.open("w:p", &[])?;
            run(xml, &format!("{label}: "), true)?;
            run(xml, entry, false)?;
            xml.close("w:p")?;
        }
    }

    let line = if step.duration.is_zero() {
        format!("{number}. {}", step.text)
    } else {
        format!("{number}. {} ({})", step.text, step.duration)
    };
    paragraph(xml, &line, false)?;

    for checkbox in &step.checkboxes {
        paragraph(xml, &format!("\u{2610} {checkbox}"), false)?;
    }
    Ok(())
}

fn paragraph(xml: &mut Markup<impl Write>, content: &str, bold: bool) -> Result<(), RenderError> {
    xml.open("w:p", &[])?;
    run(xml, content, bold)?;
    xml.close("w:p")
}

fn run(xml: &mut Markup<impl Write>, content: &str, bold: bool) -> Result<(), RenderError> {
    xml.open("w:r", &[])?;
    if bold {
        xml.open("w:rPr", &[])?;
        xml.empty("w:b", &[])?;
        xml.close("w:rPr")?;
    }
    text(xml, content)?;
    xml.close("w:r")
}

fn text(xml: &mut Markup<impl Write>, content: &str) -> Result<(), RenderError> {
    xml.element("w:t", &[("xml:space", "preserve")], content)
}
