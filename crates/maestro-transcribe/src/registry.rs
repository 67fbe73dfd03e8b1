//! Transcriber trait and extension dispatch
//!
//! Format selection is by file extension only. The registry answers
//! "which transcriber" before the source is opened, so an unsupported
//! input never reaches a parser.

use crate::error::TranscribeError;
use crate::html::HtmlTranscriber;
use crate::markdown::MarkdownTranscriber;
use crate::xml::XmlTranscriber;
use maestro_model::ProcedureDefinition;
use std::path::Path;

/// Turns one external document format into a procedure definition
///
/// Implement this trait to accept a new input format.
pub trait Transcriber: Send + Sync + 'static {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Supported file extensions (without dot, lower case)
    fn extensions(&self) -> &[&str];

    /// Check if this transcriber handles the given path
    fn can_transcribe(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }

    /// Parse `source`, attributing errors to `origin`
    ///
    /// Every task in the result is inline.
    ///
    /// # Errors
    /// `TranscribeError::Structural` when the document does not have the
    /// shape this format describes.
    fn transcribe(&self, source: &[u8], origin: &Path)
        -> Result<ProcedureDefinition, TranscribeError>;
}

/// Transcribers keyed by extension
pub struct TranscriberRegistry {
    transcribers: Vec<Box<dyn Transcriber>>,
}

impl Default for TranscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TranscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriberRegistry")
            .field("transcriber_count", &self.transcribers.len())
            .field("extensions", &self.all_extensions())
            .finish()
    }
}

impl TranscriberRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            transcribers: Vec::new(),
        }
    }

    /// Register a transcriber; earlier registrations win on overlap
    pub fn register<T: Transcriber>(&mut self, transcriber: T) {
        self.transcribers.push(Box::new(transcriber));
    }

    /// Find transcriber for path
    #[must_use]
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn Transcriber> {
        self.transcribers
            .iter()
            .find(|t| t.can_transcribe(path))
            .map(|t| &**t)
    }

    /// Like [`find_for_path`](Self::find_for_path), as a validation error
    ///
    /// # Errors
    /// `TranscribeError::UnsupportedExtension` listing what is accepted.
    pub fn require_for_path(&self, path: &Path) -> Result<&dyn Transcriber, TranscribeError> {
        self.find_for_path(path)
            .ok_or_else(|| TranscribeError::UnsupportedExtension {
                path: path.to_path_buf(),
                supported: self
                    .all_extensions()
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Get all registered extensions
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&str> {
        self.transcribers
            .iter()
            .flat_map(|t| t.extensions())
            .copied()
            .collect()
    }
}

/// Registry with the built-in HTML, XML and Markdown transcribers
#[inline]
#[must_use]
pub fn default_transcribers() -> TranscriberRegistry {
    let mut registry = TranscriberRegistry::new();
    registry.register(HtmlTranscriber);
    registry.register(XmlTranscriber);
    registry.register(MarkdownTranscriber);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTranscriber;

    impl Transcriber for TestTranscriber {
        fn name(&self) -> &'static str {
            "test"
        }

        fn extensions(&self) -> &[&str] {
            &["test"]
        }

        fn transcribe(
            &self,
            _source: &[u8],
            origin: &Path,
        ) -> Result<ProcedureDefinition, TranscribeError> {
            Err(TranscribeError::structural(origin, "test"))
        }
    }

    #[test]
    fn transcriber_matches_by_extension() {
        let transcriber = TestTranscriber;

        assert!(transcriber.can_transcribe(Path::new("file.test")));
        assert!(transcriber.can_transcribe(Path::new("/path/to/FILE.TEST")));
        assert!(!transcriber.can_transcribe(Path::new("file.txt")));
        assert!(!transcriber.can_transcribe(Path::new("file")));
    }

    #[test]
    fn default_dispatch_map() {
        let registry = default_transcribers();

        for (path, name) in [
            ("in/egress.html", "html"),
            ("in/egress.htm", "html"),
            ("in/EV1-1234.xml", "xml"),
            ("in/EV1-1234.zip", "xml"),
            ("in/egress.md", "markdown"),
            ("in/egress.markdown", "markdown"),
        ] {
            let found = registry.find_for_path(Path::new(path));
            assert_eq!(found.map(|t| t.name()), Some(name), "{path}");
        }
        assert!(registry.find_for_path(Path::new("in/egress.docx")).is_none());
    }

    #[test]
    fn unsupported_extension_lists_accepted() {
        let registry = default_transcribers();
        let Err(err) = registry.require_for_path(Path::new("in/egress.pdf")) else {
            panic!("pdf should be rejected");
        };
        assert!(matches!(err, TranscribeError::UnsupportedExtension { .. }));
        assert!(err.to_string().contains(".html"));
        assert!(err.to_string().contains(".md"));
    }

    #[test]
    fn registry_debug() {
        let debug_str = format!("{:?}", default_transcribers());
        assert!(debug_str.contains("TranscriberRegistry"));
    }
}
