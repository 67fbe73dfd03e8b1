//! Stored procedure definition schema
//!
//! The YAML shape read by the loader and written by transcribers and the
//! editor session. Ids are not part of it.
//!
//! ```yaml
//! procedure_name: Airlock Egress
//! fields:
//!   document_id: EV1-1234
//! columns:
//!   - key: IV
//!     display: IV/SSRMS
//! tasks:
//!   - file: egress.yml
//!   - title: Inline task
//!     steps:
//!       - IV:
//!           - "plain step"
//!           - step: "detailed step"
//!             duration: { minutes: 5 }
//! ```

use crate::error::DefinitionError;
use crate::timing::TimeSpan;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level procedure document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDefinition {
    /// Display name
    pub procedure_name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Format-specific field bag (e.g. `document_id`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    /// Actor columns, in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnDefinition>,
    /// Tasks in execution order
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

impl ProcedureDefinition {
    /// Parse YAML, attributing failures to `origin`
    ///
    /// # Errors
    /// `DefinitionError::Structural` on malformed YAML or schema mismatch.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self, DefinitionError> {
        serde_yaml::from_str(content)
            .map_err(|e| DefinitionError::structural(origin, e.to_string()))
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// `DefinitionError::Serialize` if serde_yaml rejects the value.
    pub fn to_yaml(&self, destination: &Path) -> Result<String, DefinitionError> {
        serde_yaml::to_string(self).map_err(|e| DefinitionError::Serialize {
            path: destination.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// File names of referenced task definitions
    pub fn task_references(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().filter_map(|entry| match entry {
            TaskEntry::Reference { file } => Some(file.as_str()),
            TaskEntry::Inline(_) => None,
        })
    }
}

/// One actor column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Key used by divisions
    pub key: String,
    /// Header text; defaults to the key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Actors working in this column
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<String>,
}

/// A task either referenced from the tasks directory or written inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskEntry {
    /// `- file: egress.yml`
    Reference {
        /// File name inside the tasks directory; no directories or `..`
        file: String,
    },
    /// Inline task body
    Inline(TaskDefinition),
}

/// One task (activity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task title
    pub title: String,
    /// Scheduled start offset from procedure start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<TimeSpan>,
    /// Explicit column assignment; derived from divisions when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    /// Divisions in order
    #[serde(default)]
    pub steps: Vec<DivisionDefinition>,
}

/// Column key → steps for one division
pub type DivisionDefinition = IndexMap<String, Vec<StepDefinition>>;

/// A step: bare text or a detailed mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepDefinition {
    /// `- "text"`
    Text(String),
    /// `- step: "text"` plus details
    Detailed(DetailedStep),
}

/// Step with optional details
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetailedStep {
    /// Instruction text
    pub step: String,
    /// Optional heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Expected duration
    #[serde(default, skip_serializing_if = "TimeSpan::is_zero_ref")]
    pub duration: TimeSpan,
    /// Warnings shown before the step
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub warning: Vec<String>,
    /// Cautions shown before the step
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub caution: Vec<String>,
    /// Notes shown before the step
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<String>,
    /// Items ticked off while performing the step
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub checkboxes: Vec<String>,
}

/// Accept `key: "one"` as well as `key: [a, b]`
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
