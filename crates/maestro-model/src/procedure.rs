//! Procedure aggregate: metadata plus the ordered task collection
//!
//! Loading is all-or-nothing. A definition is parsed, its referenced task
//! files are read, and a complete `Procedure` is built before anything is
//! replaced.

use crate::definition::{ColumnDefinition, ProcedureDefinition, TaskDefinition, TaskEntry};
use crate::error::{DefinitionError, EditError};
use crate::id::TaskId;
use crate::task::Task;
use crate::tasks_handler::TasksHandler;
use crate::timing::TaskTiming;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Field holding the external interchange identifier
pub const DOCUMENT_ID_FIELD: &str = "document_id";

/// Whether `name` is a single normal path component
///
/// Names used to build paths inside a directory (task file references,
/// document ids) must not be absolute, empty, or contain `..` or separators.
#[must_use]
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// One actor column of a procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Key used by divisions
    pub key: String,
    /// Header text, if different from the key
    pub display: Option<String>,
    /// Actors working in this column
    pub actors: Vec<String>,
}

impl Column {
    /// Column with key only
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display: None,
            actors: Vec::new(),
        }
    }

    /// Header text
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.key)
    }

    fn from_definition(definition: &ColumnDefinition) -> Self {
        Self {
            key: definition.key.clone(),
            display: definition.display.clone(),
            actors: definition.actors.clone(),
        }
    }

    fn definition(&self) -> ColumnDefinition {
        ColumnDefinition {
            key: self.key.clone(),
            display: self.display.clone(),
            actors: self.actors.clone(),
        }
    }
}

/// Serialized procedure plus the task files it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedProcedure {
    /// Procedure definition YAML
    pub procedure: String,
    /// `(file name, YAML)` for each referenced task
    pub task_files: Vec<(String, String)>,
}

/// A loaded procedure
#[derive(Debug, Clone)]
pub struct Procedure {
    /// Display name
    pub name: String,
    /// File stem of the stored definition, used to name outputs
    pub filename: String,
    /// Free-form description
    pub description: Option<String>,
    /// Format-specific fields
    pub fields: BTreeMap<String, String>,
    columns: Vec<Column>,
    tasks: TasksHandler,
}

impl Procedure {
    /// Empty procedure
    #[must_use]
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            description: None,
            fields: BTreeMap::new(),
            columns: Vec::new(),
            tasks: TasksHandler::new(),
        }
    }

    /// Default task directory for a definition: `<dir>/../tasks`
    #[must_use]
    pub fn default_tasks_dir(definition_path: &Path) -> PathBuf {
        definition_path
            .parent()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."))
            .join("tasks")
    }

    /// Load a stored definition, resolving task files next to it
    ///
    /// # Errors
    /// See [`load_with_tasks_dir`](Self::load_with_tasks_dir).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        Self::load_with_tasks_dir(path, &Self::default_tasks_dir(path)).await
    }

    /// Load a stored definition, resolving task files in `tasks_dir`
    ///
    /// # Errors
    /// - `DefinitionError::Io` if the definition itself can't be read
    /// - `DefinitionError::Structural` for malformed content, naming the file.
    ///   A task reference that is not a plain file name, is listed twice, or
    ///   can't be read is structural and names the definition.
    pub async fn load_with_tasks_dir(path: &Path, tasks_dir: &Path) -> Result<Self, DefinitionError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DefinitionError::io_error(path, e))?;
        let definition = ProcedureDefinition::from_yaml(&content, path)?;

        let mut referenced = HashMap::new();
        for file in definition.task_references() {
            if !is_plain_file_name(file) {
                return Err(DefinitionError::structural(
                    path,
                    format!("task file '{file}' must be a plain file name inside the tasks directory"),
                ));
            }
            if referenced.contains_key(file) {
                return Err(DefinitionError::structural(
                    path,
                    format!("task file '{file}' is referenced more than once"),
                ));
            }
            let task_path = tasks_dir.join(file);
            let content = tokio::fs::read_to_string(&task_path).await.map_err(|e| {
                DefinitionError::structural(
                    path,
                    format!("cannot read task file {}: {e}", task_path.display()),
                )
            })?;
            let task: TaskDefinition = serde_yaml::from_str(&content)
                .map_err(|e| DefinitionError::structural(&task_path, e.to_string()))?;
            referenced.insert(file.to_string(), (task, task_path));
        }

        let filename = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let procedure = Self::build(&definition, filename, path, &referenced)?;
        tracing::debug!(
            path = %path.display(),
            tasks = procedure.tasks.len(),
            "loaded procedure definition"
        );
        Ok(procedure)
    }

    /// Replace this procedure with the definition at `path`
    ///
    /// On error `self` is left unchanged and the error names the failing file.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub async fn add_definition_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), DefinitionError> {
        *self = Self::load(path).await?;
        Ok(())
    }

    /// Build from a definition whose tasks are all inline
    ///
    /// # Errors
    /// `DefinitionError::Structural` naming `origin` for any inconsistency,
    /// including task references (use [`load`](Self::load) for those).
    pub fn from_definition(
        definition: &ProcedureDefinition,
        filename: impl Into<String>,
        origin: &Path,
    ) -> Result<Self, DefinitionError> {
        Self::build(definition, filename.into(), origin, &HashMap::new())
    }

    fn build(
        definition: &ProcedureDefinition,
        filename: String,
        origin: &Path,
        referenced: &HashMap<String, (TaskDefinition, PathBuf)>,
    ) -> Result<Self, DefinitionError> {
        let name = definition.procedure_name.trim();
        if name.is_empty() {
            return Err(DefinitionError::structural(origin, "procedure_name is empty"));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(definition.columns.len());
        for column in &definition.columns {
            if columns.iter().any(|c| c.key == column.key) {
                return Err(DefinitionError::structural(
                    origin,
                    format!("column '{}' declared twice", column.key),
                ));
            }
            columns.push(Column::from_definition(column));
        }
        let declared: Vec<String> = columns.iter().map(|c| c.key.clone()).collect();

        let mut tasks = Vec::with_capacity(definition.tasks.len());
        for entry in &definition.tasks {
            let task = match entry {
                TaskEntry::Inline(task) => Task::from_definition(task, &declared, None)
                    .map_err(|e| DefinitionError::structural(origin, e))?,
                TaskEntry::Reference { file } => {
                    let (task, task_path) = referenced.get(file).ok_or_else(|| {
                        DefinitionError::structural(
                            origin,
                            format!("task file '{file}' was not resolved"),
                        )
                    })?;
                    Task::from_definition(task, &declared, Some(file.clone()))
                        .map_err(|e| DefinitionError::structural(task_path, e))?
                }
            };
            tasks.push(task);
        }

        if columns.is_empty() {
            for key in tasks.iter().flat_map(|task| task.columns()) {
                if !columns.iter().any(|c| &c.key == key) {
                    columns.push(Column::new(key.clone()));
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            filename,
            description: definition.description.clone(),
            fields: definition.fields.clone(),
            columns,
            tasks: TasksHandler::from_tasks(tasks),
        })
    }

    /// Actor columns in display order
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column by key
    #[must_use]
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Ordered tasks
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &TasksHandler {
        &self.tasks
    }

    /// Ordered tasks, for structural edits
    #[inline]
    pub fn tasks_mut(&mut self) -> &mut TasksHandler {
        &mut self.tasks
    }

    /// Value from the field bag
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// External interchange identifier
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.field(DOCUMENT_ID_FIELD).filter(|id| !id.trim().is_empty())
    }

    /// Per-task schedule
    #[must_use]
    pub fn timeline(&self) -> Vec<TaskTiming> {
        self.tasks.timeline()
    }

    /// Create a task from `definition` before `index` (`len` appends)
    ///
    /// # Errors
    /// - `EditError::InvalidTask` if the definition is inconsistent with
    ///   the procedure's columns
    /// - `EditError::IndexOutOfBounds` if `index > len`
    pub fn insert_task(&mut self, index: usize, definition: &TaskDefinition) -> Result<TaskId, EditError> {
        let task = self.task_from_definition(definition)?;
        self.tasks.insert(index, task)
    }

    /// Create a task from `definition` at the end
    ///
    /// # Errors
    /// `EditError::InvalidTask` if the definition is inconsistent with the
    /// procedure's columns.
    pub fn append_task(&mut self, definition: &TaskDefinition) -> Result<TaskId, EditError> {
        let task = self.task_from_definition(definition)?;
        let len = self.tasks.len();
        self.tasks.insert(len, task)
    }

    fn task_from_definition(&self, definition: &TaskDefinition) -> Result<Task, EditError> {
        let declared: Vec<String> = self.columns.iter().map(|c| c.key.clone()).collect();
        Task::from_definition(definition, &declared, None).map_err(EditError::InvalidTask)
    }

    /// Stored form; tasks loaded from files stay references
    #[must_use]
    pub fn definition(&self) -> ProcedureDefinition {
        ProcedureDefinition {
            procedure_name: self.name.clone(),
            description: self.description.clone(),
            fields: self.fields.clone(),
            columns: self.columns.iter().map(Column::definition).collect(),
            tasks: self
                .tasks
                .iter()
                .map(|task| match task.source_file() {
                    Some(file) => TaskEntry::Reference {
                        file: file.to_string(),
                    },
                    None => TaskEntry::Inline(task.definition()),
                })
                .collect(),
        }
    }

    /// Stored form with every task inline
    #[must_use]
    pub fn inline_definition(&self) -> ProcedureDefinition {
        ProcedureDefinition {
            tasks: self
                .tasks
                .iter()
                .map(|task| TaskEntry::Inline(task.definition()))
                .collect(),
            ..self.definition()
        }
    }

    /// Definitions of tasks loaded from task files
    #[must_use]
    pub fn referenced_task_definitions(&self) -> Vec<(String, TaskDefinition)> {
        self.tasks
            .iter()
            .filter_map(|task| {
                task.source_file()
                    .map(|file| (file.to_string(), task.definition()))
            })
            .collect()
    }

    /// YAML for the definition and each referenced task file
    ///
    /// # Errors
    /// `DefinitionError::Serialize` naming `destination`.
    pub fn serialize(&self, destination: &Path) -> Result<SerializedProcedure, DefinitionError> {
        let procedure = self.definition().to_yaml(destination)?;
        let task_files = self
            .referenced_task_definitions()
            .into_iter()
            .map(|(file, task)| {
                serde_yaml::to_string(&task)
                    .map(|yaml| (file, yaml))
                    .map_err(|e| DefinitionError::Serialize {
                        path: destination.to_path_buf(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(SerializedProcedure {
            procedure,
            task_files,
        })
    }

    /// Write the definition to `path` and task files to `<dir>/../tasks`
    ///
    /// # Errors
    /// `DefinitionError::Io` or `DefinitionError::Serialize` naming the file.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), DefinitionError> {
        let path = path.as_ref();
        let serialized = self.serialize(path)?;
        write_serialized(&serialized, path, &Self::default_tasks_dir(path)).await
    }
}

/// Persist a serialized procedure
///
/// Task files are checked before anything is written.
///
/// # Errors
/// - `DefinitionError::Structural` naming `path` if a task file name is not
///   a plain file name or appears twice
/// - `DefinitionError::Io` naming the file that failed
pub async fn write_serialized(
    serialized: &SerializedProcedure,
    path: &Path,
    tasks_dir: &Path,
) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for (file, _) in &serialized.task_files {
        if !is_plain_file_name(file) {
            return Err(DefinitionError::structural(
                path,
                format!("task file '{file}' must be a plain file name inside the tasks directory"),
            ));
        }
        if !seen.insert(file.as_str()) {
            return Err(DefinitionError::structural(
                path,
                format!("task file '{file}' would be written twice"),
            ));
        }
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DefinitionError::io_error(parent, e))?;
    }
    tokio::fs::write(path, &serialized.procedure)
        .await
        .map_err(|e| DefinitionError::io_error(path, e))?;

    if !serialized.task_files.is_empty() {
        tokio::fs::create_dir_all(tasks_dir)
            .await
            .map_err(|e| DefinitionError::io_error(tasks_dir, e))?;
    }
    for (file, yaml) in &serialized.task_files {
        let task_path = tasks_dir.join(file);
        tokio::fs::write(&task_path, yaml)
            .await
            .map_err(|e| DefinitionError::io_error(&task_path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INLINE: &str = r#"
procedure_name: Airlock Egress
fields:
  document_id: EV1-1234
columns:
  - key: IV
  - key: EV1
tasks:
  - title: Prep
    steps:
      - IV: ["configure"]
        EV1: ["don suit"]
  - title: Egress
    steps:
      - EV1: ["open hatch"]
      - EV1: ["exit"]
"#;

    fn inline_procedure() -> Procedure {
        let def = ProcedureDefinition::from_yaml(INLINE, Path::new("egress.yml")).unwrap();
        Procedure::from_definition(&def, "egress", Path::new("egress.yml")).unwrap()
    }

    #[test]
    fn builds_inline_procedure() {
        let procedure = inline_procedure();
        assert_eq!(procedure.name, "Airlock Egress");
        assert_eq!(procedure.document_id(), Some("EV1-1234"));
        assert_eq!(procedure.tasks().len(), 2);
        assert_eq!(procedure.tasks().get(1).unwrap().columns(), &["EV1".to_string()]);
    }

    #[test]
    fn duplicate_column_is_structural() {
        let yaml = "procedure_name: X\ncolumns: [{key: IV}, {key: IV}]\n";
        let def = ProcedureDefinition::from_yaml(yaml, Path::new("x.yml")).unwrap();
        let err = Procedure::from_definition(&def, "x", Path::new("x.yml")).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn unresolved_reference_is_structural() {
        let yaml = "procedure_name: X\ntasks:\n  - file: missing.yml\n";
        let def = ProcedureDefinition::from_yaml(yaml, Path::new("x.yml")).unwrap();
        let err = Procedure::from_definition(&def, "x", Path::new("x.yml")).unwrap_err();
        assert!(matches!(err, DefinitionError::Structural { .. }));
    }

    #[test]
    fn columns_derived_when_undeclared() {
        let yaml = r#"
procedure_name: X
tasks:
  - title: A
    steps:
      - EV2: ["a"]
        EV1: ["b"]
"#;
        let def = ProcedureDefinition::from_yaml(yaml, Path::new("x.yml")).unwrap();
        let procedure = Procedure::from_definition(&def, "x", Path::new("x.yml")).unwrap();
        let keys: Vec<_> = procedure.columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["EV2", "EV1"]);
    }

    #[test]
    fn insert_task_rejects_undeclared_column() {
        let mut procedure = inline_procedure();
        let def: TaskDefinition =
            serde_yaml::from_str("title: Stray\nsteps:\n  - EV9: [\"x\"]\n").unwrap();

        let err = procedure.insert_task(0, &def).unwrap_err();

        assert!(matches!(err, EditError::InvalidTask(_)));
        assert_eq!(procedure.tasks().len(), 2);
    }

    #[test]
    fn insert_task_indexes_new_task() {
        let mut procedure = inline_procedure();
        let def: TaskDefinition =
            serde_yaml::from_str("title: Ingress\nsteps:\n  - EV1: [\"enter\"]\n").unwrap();

        let id = procedure.insert_task(1, &def).unwrap();

        assert_eq!(procedure.tasks().task_index_of(id), Some(1));
        assert_eq!(procedure.tasks().len(), 3);
    }

    #[test]
    fn definition_round_trips_through_yaml() {
        let procedure = inline_procedure();
        let yaml = procedure.definition().to_yaml(Path::new("egress.yml")).unwrap();
        let def = ProcedureDefinition::from_yaml(&yaml, Path::new("egress.yml")).unwrap();
        let reloaded = Procedure::from_definition(&def, "egress", Path::new("egress.yml")).unwrap();

        assert_eq!(reloaded.definition(), procedure.definition());
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("prep.yml"));
        assert!(is_plain_file_name("EV1-1234"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../escaped"));
        assert!(!is_plain_file_name("nested/prep.yml"));
        assert!(!is_plain_file_name("/etc/passwd"));
    }

    #[tokio::test]
    async fn write_rejects_escaping_task_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("procedures/egress.yml");
        let serialized = SerializedProcedure {
            procedure: "procedure_name: X\n".to_string(),
            task_files: vec![("../outside.yml".to_string(), "title: X\n".to_string())],
        };

        let err = write_serialized(&serialized, &path, &dir.path().join("tasks"))
            .await
            .unwrap_err();

        assert!(matches!(err, DefinitionError::Structural { .. }));
        assert!(err.to_string().contains("../outside.yml"));
        assert!(!path.exists());
        assert!(!dir.path().join("outside.yml").exists());
    }

    #[tokio::test]
    async fn write_rejects_duplicate_task_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("procedures/egress.yml");
        let serialized = SerializedProcedure {
            procedure: "procedure_name: X\n".to_string(),
            task_files: vec![
                ("prep.yml".to_string(), "title: A\n".to_string()),
                ("prep.yml".to_string(), "title: B\n".to_string()),
            ],
        };

        let err = write_serialized(&serialized, &path, &dir.path().join("tasks"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("written twice"));
        assert!(!path.exists());
    }

    #[test]
    fn default_tasks_dir_is_sibling_of_procedures() {
        assert_eq!(
            Procedure::default_tasks_dir(Path::new("/p/procedures/egress.yml")),
            PathBuf::from("/p/tasks")
        );
    }
}
