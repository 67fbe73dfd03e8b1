//! Maestro Transcribe - reverse pipeline
//!
//! Recovers a stored procedure definition from a document one of the
//! writers produced (or a hand-made equivalent).
//!
//! # Architecture
//!
//! ```text
//! source file → TranscriberRegistry (by extension) → Transcriber → ProcedureDefinition
//!                                                                      ↓ validated
//!                                                    <project>/procedures/<stem>.yml
//! ```
//!
//! Dispatch map: `.html`/`.htm` → HTML, `.xml`/`.zip` → interchange XML,
//! `.md`/`.markdown` → Markdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use maestro_transcribe::transcribe;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = transcribe("incoming/EV1-1234.xml".as_ref(), "project".as_ref()).await?;
//! println!("wrote {}", result.destination.display());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod assemble;
pub mod error;
pub mod html;
pub mod markdown;
mod markup;
pub mod persist;
pub mod registry;
pub mod xml;

pub use error::TranscribeError;
pub use html::HtmlTranscriber;
pub use markdown::MarkdownTranscriber;
pub use persist::{transcribe, transcribe_file, Transcription, PROCEDURES_DIR};
pub use registry::{default_transcribers, Transcriber, TranscriberRegistry};
pub use xml::XmlTranscriber;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for transcription
    pub use crate::{
        default_transcribers, transcribe, transcribe_file, TranscribeError, Transcriber,
        TranscriberRegistry, Transcription,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
