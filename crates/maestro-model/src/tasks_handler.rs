//! Ordered task collection of a procedure
//!
//! Every structural change goes through this type so the position index is
//! rebuilt before control returns. Failed operations leave the order as it
//! was.

use crate::division::Division;
use crate::error::EditError;
use crate::id::{DivisionId, TaskId};
use crate::index::PositionIndex;
use crate::step::Step;
use crate::task::Task;
use crate::timing::{TaskTiming, TimeSpan};
use std::collections::{HashMap, HashSet};

/// Where a dragged task is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropTarget {
    /// Immediately before the given task
    Before(TaskId),
    /// After the last task
    End,
}

/// Tasks in execution order plus their position index
#[derive(Debug, Clone, Default)]
pub struct TasksHandler {
    tasks: Vec<Task>,
    index: PositionIndex<TaskId>,
}

impl TasksHandler {
    /// Create empty handler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tasks(tasks: Vec<Task>) -> Self {
        let index = PositionIndex::build(&tasks);
        Self { tasks, index }
    }

    /// Tasks in order
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Iterate tasks in order
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Number of tasks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether there are no tasks
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task at index
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    /// Task by id
    #[must_use]
    pub fn get_by_id(&self, id: TaskId) -> Option<&Task> {
        self.task_index_of(id).and_then(|i| self.tasks.get(i))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, EditError> {
        let index = self
            .task_index_of(id)
            .ok_or_else(|| EditError::unknown_id("task", id))?;
        Ok(&mut self.tasks[index])
    }

    /// Insert an empty division before division `index` of task `task`
    ///
    /// # Errors
    /// - `EditError::UnknownId` for a task not in this collection
    /// - `EditError::IndexOutOfBounds` unless `index` names a division
    pub fn insert_division(&mut self, task: TaskId, index: usize) -> Result<DivisionId, EditError> {
        self.task_mut(task)?.insert_division(index)
    }

    /// Append an empty division to task `task`
    ///
    /// # Errors
    /// `EditError::UnknownId` for a task not in this collection.
    pub fn append_division(&mut self, task: TaskId) -> Result<DivisionId, EditError> {
        Ok(self.task_mut(task)?.append_division())
    }

    /// Remove division `index` of task `task`
    ///
    /// # Errors
    /// - `EditError::UnknownId` for a task not in this collection
    /// - `EditError::IndexOutOfBounds` or `EditError::LastDivision` from the task
    pub fn delete_division(&mut self, task: TaskId, index: usize) -> Result<Division, EditError> {
        self.task_mut(task)?.delete_division(index)
    }

    /// Mutable steps of one column in division `index` of task `task`
    pub fn steps_mut(&mut self, task: TaskId, index: usize, column: &str) -> Option<&mut Vec<Step>> {
        self.task_mut(task).ok()?.steps_mut(index, column)
    }

    /// Current position of a task
    #[inline]
    #[must_use]
    pub fn task_index_of(&self, id: TaskId) -> Option<usize> {
        self.index.index_of(&id)
    }

    /// Current positions of several tasks
    #[must_use]
    pub fn task_indexes_of(&self, ids: &[TaskId]) -> HashMap<TaskId, usize> {
        self.index.indexes_of(ids)
    }

    /// All task ids in order
    #[must_use]
    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(Task::id).collect()
    }

    /// Relocate the task at `from` so it ends up at `to`
    ///
    /// Both indexes address the current sequence, so `move_task(to, from)`
    /// undoes the move.
    ///
    /// # Errors
    /// `EditError::IndexOutOfBounds` if either index is not `< len`.
    pub fn move_task(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        let len = self.tasks.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditError::out_of_bounds("move_task", "task", index, len));
            }
        }
        if from == to {
            return Ok(());
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        self.index.rebuild(&self.tasks);
        tracing::debug!(from, to, "moved task");
        Ok(())
    }

    /// Drop the task `id` at `target`, returning its new index
    ///
    /// # Errors
    /// `EditError::UnknownId` if either task id is not in the sequence.
    pub fn move_task_before(&mut self, id: TaskId, target: DropTarget) -> Result<usize, EditError> {
        let from = self
            .task_index_of(id)
            .ok_or_else(|| EditError::unknown_id("task", id))?;
        let to = match target {
            DropTarget::End => self.tasks.len() - 1,
            DropTarget::Before(before) => {
                let position = self
                    .task_index_of(before)
                    .ok_or_else(|| EditError::unknown_id("task", before))?;
                if position > from {
                    position - 1
                } else {
                    position
                }
            }
        };
        self.move_task(from, to)?;
        Ok(to)
    }

    /// Remove the task at `index`; later tasks shift down by one
    ///
    /// # Errors
    /// `EditError::IndexOutOfBounds` for an invalid index.
    pub fn delete_task(&mut self, index: usize) -> Result<Task, EditError> {
        if index >= self.tasks.len() {
            return Err(EditError::out_of_bounds(
                "delete_task",
                "task",
                index,
                self.tasks.len(),
            ));
        }
        let task = self.tasks.remove(index);
        self.index.rebuild(&self.tasks);
        tracing::debug!(index, task = %task.id(), "deleted task");
        Ok(task)
    }

    /// Insert before `index` (`index == len` appends)
    pub(crate) fn insert(&mut self, index: usize, task: Task) -> Result<TaskId, EditError> {
        if index > self.tasks.len() {
            return Err(EditError::out_of_bounds(
                "insert_task",
                "task",
                index,
                self.tasks.len(),
            ));
        }
        let id = task.id();
        self.tasks.insert(index, task);
        self.index.rebuild(&self.tasks);
        tracing::debug!(index, task = %id, "inserted task");
        Ok(id)
    }

    /// Ids that are not meaningful drop targets for `id`
    ///
    /// Dropping a task before itself or before its immediate successor
    /// leaves the order unchanged. Empty for an unknown id.
    #[must_use]
    pub fn next_ids(&self, id: TaskId) -> HashSet<TaskId> {
        let Some(position) = self.task_index_of(id) else {
            return HashSet::new();
        };
        let mut excluded = HashSet::from([id]);
        if let Some(next) = self.tasks.get(position + 1) {
            excluded.insert(next.id());
        }
        excluded
    }

    /// Every drop target that changes the order when `id` is dropped there
    #[must_use]
    pub fn valid_drop_targets(&self, id: TaskId) -> Vec<DropTarget> {
        let Some(position) = self.task_index_of(id) else {
            return Vec::new();
        };
        let excluded = self.next_ids(id);
        let mut targets: Vec<DropTarget> = self
            .tasks
            .iter()
            .map(Task::id)
            .filter(|candidate| !excluded.contains(candidate))
            .map(DropTarget::Before)
            .collect();
        if position + 1 < self.tasks.len() {
            targets.push(DropTarget::End);
        }
        targets
    }

    /// Start, end and preceding gap of every task, in order
    ///
    /// A task without a declared start begins when the previous one ends.
    /// Overlaps count as a zero gap.
    #[must_use]
    pub fn timeline(&self) -> Vec<TaskTiming> {
        let mut previous_end: Option<TimeSpan> = None;
        self.tasks
            .iter()
            .map(|task| {
                let inherited = previous_end.unwrap_or(TimeSpan::ZERO);
                let start = task.start().unwrap_or(inherited);
                let gap_before = match previous_end {
                    Some(end) => start.saturating_sub(end),
                    None => TimeSpan::ZERO,
                };
                let duration = task.duration();
                let end = start + duration;
                previous_end = Some(end);
                TaskTiming {
                    task_id: task.id(),
                    start,
                    duration,
                    end,
                    gap_before,
                }
            })
            .collect()
    }

    /// Sum of all task durations
    #[must_use]
    pub fn total_duration(&self) -> TimeSpan {
        self.tasks.iter().map(Task::duration).sum()
    }
}

impl<'a> IntoIterator for &'a TasksHandler {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
