//! Testing utilities for Maestro workspace
//!
//! Fixture procedures and throwaway on-disk projects.

#![allow(missing_docs)]

use maestro_model::{Procedure, ProcedureDefinition};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two tasks, three columns, one idle gap of five minutes before `Egress`
pub const AIRLOCK_EGRESS: &str = r#"procedure_name: Airlock Egress
description: Crew egress through the airlock
fields:
  document_id: EV1-1234
columns:
  - key: IV
    display: IV/SSRMS
    actors: [IV]
  - key: EV1
    actors: [EV1]
  - key: EV2
    actors: [EV2]
tasks:
  - title: Prep
    start: { minutes: 0 }
    steps:
      - IV:
          - step: Configure airlock
            duration: { minutes: 5 }
        EV1:
          - step: Don suit
            duration: { minutes: 10 }
            caution: Check seals
        EV2:
          - Don suit
      - IV:
          - Verify pressure
        EV1: []
        EV2:
          - step: Check tether
            title: Tether
            warning: [Do not unhook]
            checkboxes: [Hook A, Hook B]
  - title: Egress
    start: { minutes: 15 }
    steps:
      - EV1:
          - step: Open hatch
            duration: { minutes: 3 }
            note: Slowly
        EV2:
          - Exit
"#;

/// Task file body for reference tests
pub const PREP_TASK: &str = r#"title: Prep
steps:
  - IV: ["Configure airlock"]
    EV1:
      - step: Don suit
        duration: { minutes: 30 }
"#;

/// Procedure referencing `prep.yml` from the tasks directory
pub const REFERENCING_PROCEDURE: &str = r#"procedure_name: Referenced Prep
fields:
  document_id: REF-1
columns:
  - key: IV
  - key: EV1
tasks:
  - file: prep.yml
  - title: Egress
    steps:
      - EV1: ["Open hatch"]
"#;

/// Definition that fails to parse
pub const MALFORMED: &str = "procedure_name: [unclosed\ntasks: {\n";

/// Parsed [`AIRLOCK_EGRESS`] with filename `airlock-egress`
pub fn airlock_egress() -> Procedure {
    let origin = Path::new("airlock-egress.yml");
    let definition = ProcedureDefinition::from_yaml(AIRLOCK_EGRESS, origin).unwrap();
    Procedure::from_definition(&definition, "airlock-egress", origin).unwrap()
}

/// Temporary project with `procedures/` and `tasks/` directories
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("procedures")).unwrap();
        fs::create_dir_all(dir.path().join("tasks")).unwrap();
        Self { dir }
    }

    /// Project without the standard directories
    pub fn bare() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn procedures_dir(&self) -> PathBuf {
        self.path().join("procedures")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.path().join("tasks")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("build")
    }

    pub fn with_procedure(self, file: &str, content: &str) -> Self {
        fs::write(self.procedures_dir().join(file), content).unwrap();
        self
    }

    pub fn with_task(self, file: &str, content: &str) -> Self {
        fs::write(self.tasks_dir().join(file), content).unwrap();
        self
    }

    pub fn with_file(self, relative: &str, content: &[u8]) -> Self {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn procedure_path(&self, file: &str) -> PathBuf {
        self.procedures_dir().join(file)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_parses() {
        let procedure = airlock_egress();
        assert_eq!(procedure.tasks().len(), 2);
        assert_eq!(procedure.document_id(), Some("EV1-1234"));
        assert!(procedure.timeline()[1].has_gap());
    }

    #[test]
    fn project_layout() {
        let project = TestProject::new().with_procedure("a.yml", AIRLOCK_EGRESS);
        assert!(project.procedure_path("a.yml").is_file());
        assert!(project.tasks_dir().is_dir());
        assert!(!project.output_dir().exists());
    }
}
