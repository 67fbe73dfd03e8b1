//! Thin event-writer wrapper shared by the XML-shaped backends

use crate::error::RenderError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

pub(crate) struct Markup<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> Markup<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            writer: Writer::new(inner),
        }
    }

    pub(crate) fn indented(inner: W) -> Self {
        Self {
            writer: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    pub(crate) fn declaration(&mut self) -> Result<(), RenderError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
    }

    pub(crate) fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), RenderError> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Start(start))
    }

    pub(crate) fn close(&mut self, name: &str) -> Result<(), RenderError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    pub(crate) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), RenderError> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Empty(start))
    }

    pub(crate) fn text(&mut self, text: &str) -> Result<(), RenderError> {
        self.event(Event::Text(BytesText::new(text)))
    }

    /// `<name attrs>text</name>`
    pub(crate) fn element(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), RenderError> {
        self.open(name, attributes)?;
        self.text(text)?;
        self.close(name)
    }

    /// Pre-rendered fragment, written unescaped
    pub(crate) fn raw(&mut self, fragment: &[u8]) -> Result<(), RenderError> {
        self.writer.get_mut().write_all(fragment).map_err(RenderError::serialization)
    }

    pub(crate) fn inner(&self) -> &W {
        self.writer.get_ref()
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        self.writer.write_event(event).map_err(RenderError::serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let mut markup = Markup::new(Vec::new());
        markup.element("step", &[("title", "a \"b\"")], "x < y & z").unwrap();
        let xml = String::from_utf8(markup.into_inner()).unwrap();
        assert_eq!(xml, r#"<step title="a &quot;b&quot;">x &lt; y &amp; z</step>"#);
    }
}
