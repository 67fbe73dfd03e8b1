//! Editor session
//!
//! Holds one loaded procedure for interactive editing. The session is
//! created by [`EditorSession::open`], changed only through its named
//! operations and ended with [`EditorSession::close`]. Every operation is
//! applied in full or not at all; [`EditorSession::save_change`] then
//! persists the result.

use crate::error::{MaestroError, Result};
use maestro_model::{
    write_serialized, DivisionId, DropTarget, EditError, Procedure, SerializedProcedure, Task,
    TaskId,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One row of a printed timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub index: usize,
    pub title: String,
    pub start: String,
    pub duration: String,
    pub end: String,
    pub gap_before: String,
    pub divisions: usize,
}

/// A procedure open for editing
#[derive(Debug)]
pub struct EditorSession {
    path: PathBuf,
    tasks_dir: PathBuf,
    procedure: Procedure,
    saved: SerializedProcedure,
    dirty: bool,
}

impl EditorSession {
    /// Open the definition at `path`, resolving task files in `<dir>/../tasks`
    ///
    /// # Errors
    /// `StructuralParse` or `Io` naming the file that failed to load.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::open_with_tasks_dir(path, &Procedure::default_tasks_dir(path)).await
    }

    /// Open the definition at `path`, resolving task files in `tasks_dir`
    ///
    /// # Errors
    /// See [`open`](Self::open).
    pub async fn open_with_tasks_dir(path: &Path, tasks_dir: &Path) -> Result<Self> {
        let procedure = Procedure::load_with_tasks_dir(path, tasks_dir).await?;
        let saved = procedure.serialize(path)?;
        tracing::info!(
            path = %path.display(),
            tasks = procedure.tasks().len(),
            "opened editor session"
        );
        Ok(Self {
            path: path.to_path_buf(),
            tasks_dir: tasks_dir.to_path_buf(),
            procedure,
            saved,
            dirty: false,
        })
    }

    /// The procedure being edited
    #[must_use]
    pub fn procedure(&self) -> &Procedure {
        &self.procedure
    }

    /// Definition file this session saves to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an edit has been applied since the last save
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Id of the task at `index`
    ///
    /// # Errors
    /// `InvalidEditOperation` for an index outside the task list.
    pub fn task_id_at(&self, index: usize) -> Result<TaskId> {
        let tasks = self.procedure.tasks();
        tasks
            .get(index)
            .map(Task::id)
            .ok_or_else(|| EditError::out_of_bounds("select_task", "task", index, tasks.len()).into())
    }

    /// Id of division `index` within `task`
    ///
    /// # Errors
    /// `InvalidEditOperation` for an unknown task or index.
    pub fn division_id_at(&self, task: TaskId, index: usize) -> Result<DivisionId> {
        let task = self.task(task)?;
        task.division(index)
            .map(|division| division.id())
            .ok_or_else(|| {
                EditError::out_of_bounds("select_division", "division", index, task.divisions().len()).into()
            })
    }

    /// Move task `id` to `target`, returning its new index
    ///
    /// # Errors
    /// `InvalidEditOperation` for an unknown id; nothing changes.
    pub fn move_task(&mut self, id: TaskId, target: DropTarget) -> Result<usize> {
        let index = self.procedure.tasks_mut().move_task_before(id, target)?;
        self.touch("move_task");
        Ok(index)
    }

    /// Move the task at `from` so it ends up at `to`
    ///
    /// # Errors
    /// `InvalidEditOperation` unless both indexes are in bounds.
    pub fn move_task_to(&mut self, from: usize, to: usize) -> Result<()> {
        self.procedure.tasks_mut().move_task(from, to)?;
        self.touch("move_task");
        Ok(())
    }

    /// Delete task `id`, returning it
    ///
    /// # Errors
    /// `InvalidEditOperation` for an unknown id.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task> {
        let tasks = self.procedure.tasks_mut();
        let index = tasks
            .task_index_of(id)
            .ok_or_else(|| EditError::unknown_id("task", id))?;
        let task = tasks.delete_task(index)?;
        self.touch("delete_task");
        Ok(task)
    }

    /// Insert an empty division before `before` in task `task`
    ///
    /// # Errors
    /// `InvalidEditOperation` for an unknown task or division id.
    pub fn insert_division(&mut self, task: TaskId, before: DivisionId) -> Result<DivisionId> {
        let index = self
            .task(task)?
            .division_index_of(before)
            .ok_or_else(|| EditError::unknown_id("division", before))?;
        let id = self.procedure.tasks_mut().insert_division(task, index)?;
        self.touch("insert_division");
        Ok(id)
    }

    /// Append an empty division to task `task`
    ///
    /// # Errors
    /// `InvalidEditOperation` for an unknown task id.
    pub fn append_division(&mut self, task: TaskId) -> Result<DivisionId> {
        let id = self.procedure.tasks_mut().append_division(task)?;
        self.touch("append_division");
        Ok(id)
    }

    /// Delete division `division` of task `task`
    ///
    /// # Errors
    /// `InvalidEditOperation` for unknown ids or when it is the task's only
    /// division; the task is left unchanged.
    pub fn delete_division(&mut self, task: TaskId, division: DivisionId) -> Result<()> {
        let index = self
            .task(task)?
            .division_index_of(division)
            .ok_or_else(|| EditError::unknown_id("division", division))?;
        self.procedure.tasks_mut().delete_division(task, index)?;
        self.touch("delete_division");
        Ok(())
    }

    /// Persist the procedure if its serialized form changed
    ///
    /// Returns whether anything was written. Referenced task files are
    /// rewritten alongside the definition.
    ///
    /// # Errors
    /// `Io` / `PermissionDenied` naming the file that failed to write.
    pub async fn save_change(&mut self) -> Result<bool> {
        let serialized = self.procedure.serialize(&self.path)?;
        if serialized == self.saved {
            self.dirty = false;
            return Ok(false);
        }
        write_serialized(&serialized, &self.path, &self.tasks_dir).await?;
        tracing::info!(path = %self.path.display(), "saved procedure");
        self.saved = serialized;
        self.dirty = false;
        Ok(true)
    }

    /// Per-task timing in order
    #[must_use]
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        let tasks = self.procedure.tasks();
        tasks
            .timeline()
            .into_iter()
            .zip(tasks.iter())
            .enumerate()
            .map(|(index, (timing, task))| TimelineEntry {
                index,
                title: task.title().to_string(),
                start: timing.start.to_clock(),
                duration: timing.duration.to_clock(),
                end: timing.end.to_clock(),
                gap_before: timing.gap_before.to_clock(),
                divisions: task.divisions().len(),
            })
            .collect()
    }

    /// End the session, handing back the procedure
    #[must_use]
    pub fn close(self) -> Procedure {
        if self.dirty {
            tracing::warn!(path = %self.path.display(), "closing editor session with unsaved changes");
        }
        self.procedure
    }

    fn task(&self, id: TaskId) -> Result<&Task> {
        self.procedure
            .tasks()
            .get_by_id(id)
            .ok_or_else(|| MaestroError::from(EditError::unknown_id("task", id)))
    }

    fn touch(&mut self, operation: &'static str) {
        self.dirty = true;
        tracing::debug!(path = %self.path.display(), operation, "applied edit");
    }
}
