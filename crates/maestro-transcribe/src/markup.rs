//! Helpers over the quick-xml event reader

use crate::error::TranscribeError;
use quick_xml::events::{BytesStart, BytesText};
use quick_xml::Reader;
use std::path::Path;

/// Reader over well-formed or loosely-closed markup
pub(crate) fn reader(text: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    reader.check_end_names(false);
    reader
}

/// Lower-cased local name, so `<TD>` and `<td>` match
pub(crate) fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

pub(crate) fn attribute(
    start: &BytesStart<'_>,
    name: &str,
    origin: &Path,
) -> Result<Option<String>, TranscribeError> {
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| TranscribeError::structural(origin, format!("bad attribute: {e}")))?;
        if attribute.key.as_ref() == name.as_bytes() {
            let value = attribute
                .unescape_value()
                .map_err(|e| TranscribeError::structural(origin, format!("bad attribute '{name}': {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Whether the `class` attribute lists `wanted`
pub(crate) fn has_class(class: Option<&str>, wanted: &str) -> bool {
    class.is_some_and(|class| class.split_whitespace().any(|c| c == wanted))
}

/// Unescaped text; unknown entities (e.g. `&nbsp;`) are kept verbatim
pub(crate) fn text(text: &BytesText<'_>) -> String {
    text.unescape()
        .map_or_else(|_| String::from_utf8_lossy(text).into_owned(), |t| t.into_owned())
}

/// Drop `<tag>..</tag>` blocks whose content is not markup (style, script)
pub(crate) fn strip_raw_text(html: &str, tag: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut stripped = String::with_capacity(html.len());
    let mut cursor = 0;
    let mut search = 0;
    while let Some(start) = lower[search..].find(&open).map(|i| i + search) {
        // `<styles>` or `<scripted>` are other elements
        let after = lower[start + open.len()..].chars().next();
        if !after.is_some_and(|c| c == '>' || c == '/' || c.is_ascii_whitespace()) {
            search = start + open.len();
            continue;
        }
        let Some(end) = lower[start..].find(&close).map(|i| i + start + close.len()) else {
            break;
        };
        stripped.push_str(&html[cursor..start]);
        cursor = end;
        search = end;
    }
    stripped.push_str(&html[cursor..]);
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_style_blocks() {
        let html = "<head><STYLE>a < b { }</STYLE><title>x</title></head>";
        assert_eq!(strip_raw_text(html, "style"), "<head><title>x</title></head>");
    }

    #[test]
    fn similarly_named_elements_are_kept() {
        let html = "<styles>keep</styles><style type=\"text/css\">p {}</style><scripts>too</scripts>";
        assert_eq!(
            strip_raw_text(&strip_raw_text(html, "style"), "script"),
            "<styles>keep</styles><scripts>too</scripts>"
        );
    }

    #[test]
    fn class_lists_match_whole_words() {
        assert!(has_class(Some("step highlighted"), "step"));
        assert!(!has_class(Some("step-text"), "step"));
        assert!(!has_class(None, "step"));
    }
}
