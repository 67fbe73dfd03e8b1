//! Task (activity): an ordered sequence of divisions over a fixed set of
//! actor columns. Owns the division-level structural edits.

use crate::definition::TaskDefinition;
use crate::division::Division;
use crate::error::EditError;
use crate::id::{DivisionId, TaskId};
use crate::index::{Identified, PositionIndex};
use crate::step::Step;
use crate::timing::TimeSpan;
use std::collections::HashMap;

/// One activity of a procedure
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    title: String,
    columns: Vec<String>,
    start: Option<TimeSpan>,
    source_file: Option<String>,
    divisions: Vec<Division>,
    division_index: PositionIndex<DivisionId>,
}

impl Task {
    /// Build from stored form
    ///
    /// `declared` is the procedure's column order; when non-empty every task
    /// column must appear in it. The error string describes the problem.
    pub(crate) fn from_definition(
        definition: &TaskDefinition,
        declared: &[String],
        source_file: Option<String>,
    ) -> Result<Self, String> {
        let title = definition.title.trim();
        if title.is_empty() {
            return Err("task has an empty title".to_string());
        }
        if definition.steps.is_empty() {
            return Err(format!("task '{title}' has no divisions"));
        }

        let columns = Self::resolve_columns(definition, declared)
            .map_err(|e| format!("task '{title}': {e}"))?;

        let divisions = definition
            .steps
            .iter()
            .enumerate()
            .map(|(position, division)| {
                Division::from_definition(division, &columns)
                    .map_err(|e| format!("task '{title}', division {}: {e}", position + 1))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: TaskId::new(),
            title: title.to_string(),
            columns,
            start: definition.start,
            source_file,
            division_index: PositionIndex::build(&divisions),
            divisions,
        })
    }

    /// Explicit assignment, or columns in order of first use
    fn resolve_columns(definition: &TaskDefinition, declared: &[String]) -> Result<Vec<String>, String> {
        let mut columns: Vec<String> = Vec::new();
        if definition.columns.is_empty() {
            for key in definition.steps.iter().flat_map(|division| division.keys()) {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
            if !declared.is_empty() {
                columns.sort_by_key(|c| declared.iter().position(|d| d == c).unwrap_or(usize::MAX));
            }
        } else {
            for key in &definition.columns {
                if columns.contains(key) {
                    return Err(format!("column '{key}' assigned twice"));
                }
                columns.push(key.clone());
            }
        }

        if !declared.is_empty() {
            if let Some(unknown) = columns.iter().find(|c| !declared.contains(c)) {
                return Err(format!("column '{unknown}' is not declared by the procedure"));
            }
        }
        Ok(columns)
    }

    /// Task id
    #[inline]
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Task title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Actor columns this task uses, in display order
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Declared start offset, if any
    #[inline]
    #[must_use]
    pub fn start(&self) -> Option<TimeSpan> {
        self.start
    }

    /// Task file this task was loaded from, if it was referenced
    #[inline]
    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Divisions in order
    #[inline]
    #[must_use]
    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    /// Division at index
    #[inline]
    #[must_use]
    pub fn division(&self, index: usize) -> Option<&Division> {
        self.divisions.get(index)
    }

    /// Mutable steps of one column in the division at `index`
    ///
    /// Step content can change freely; the division itself and the task's
    /// column set stay fixed.
    pub fn steps_mut(&mut self, index: usize, column: &str) -> Option<&mut Vec<Step>> {
        self.divisions.get_mut(index)?.steps_mut(column)
    }

    /// Current position of a division
    #[inline]
    #[must_use]
    pub fn division_index_of(&self, id: DivisionId) -> Option<usize> {
        self.division_index.index_of(&id)
    }

    /// Current positions of several divisions
    #[must_use]
    pub fn division_indexes_of(&self, ids: &[DivisionId]) -> HashMap<DivisionId, usize> {
        self.division_index.indexes_of(ids)
    }

    /// Insert an empty division immediately before `index`
    ///
    /// # Errors
    /// `EditError::IndexOutOfBounds` unless `index < len`; use
    /// [`append_division`](Self::append_division) to add at the end.
    pub fn insert_division(&mut self, index: usize) -> Result<DivisionId, EditError> {
        if index >= self.divisions.len() {
            return Err(EditError::out_of_bounds(
                "insert_division",
                "division",
                index,
                self.divisions.len(),
            ));
        }
        let division = Division::empty(&self.columns);
        let id = division.id();
        self.divisions.insert(index, division);
        self.division_index.rebuild(&self.divisions);
        tracing::debug!(task = %self.id, index, "inserted division");
        Ok(id)
    }

    /// Add an empty division at the end
    pub fn append_division(&mut self) -> DivisionId {
        let division = Division::empty(&self.columns);
        let id = division.id();
        self.divisions.push(division);
        self.division_index.rebuild(&self.divisions);
        tracing::debug!(task = %self.id, index = self.divisions.len() - 1, "appended division");
        id
    }

    /// Remove the division at `index`
    ///
    /// # Errors
    /// - `EditError::IndexOutOfBounds` for an invalid index
    /// - `EditError::LastDivision` if it is the task's only division
    pub fn delete_division(&mut self, index: usize) -> Result<Division, EditError> {
        if index >= self.divisions.len() {
            return Err(EditError::out_of_bounds(
                "delete_division",
                "division",
                index,
                self.divisions.len(),
            ));
        }
        if self.divisions.len() == 1 {
            return Err(EditError::LastDivision {
                task: self.title.clone(),
            });
        }
        let removed = self.divisions.remove(index);
        self.division_index.rebuild(&self.divisions);
        tracing::debug!(task = %self.id, index, "deleted division");
        Ok(removed)
    }

    /// Sum of division durations
    #[must_use]
    pub fn duration(&self) -> TimeSpan {
        self.divisions.iter().map(Division::duration).sum()
    }

    /// Total steps in all divisions
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.divisions.iter().map(Division::step_count).sum()
    }

    /// Stored form
    #[must_use]
    pub fn definition(&self) -> TaskDefinition {
        TaskDefinition {
            title: self.title.clone(),
            start: self.start,
            columns: self.columns.clone(),
            steps: self.divisions.iter().map(Division::definition).collect(),
        }
    }
}

impl Identified for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DivisionDefinition, StepDefinition};

    fn division(entries: &[(&str, &[&str])]) -> DivisionDefinition {
        entries
            .iter()
            .map(|(column, steps)| {
                (
                    (*column).to_string(),
                    steps.iter().map(|s| StepDefinition::Text((*s).to_string())).collect(),
                )
            })
            .collect()
    }

    fn sample_task() -> Task {
        let def = TaskDefinition {
            title: "Egress".to_string(),
            start: None,
            columns: Vec::new(),
            steps: vec![
                division(&[("EV1", &["open hatch"]), ("IV", &["monitor"])]),
                division(&[("EV1", &["exit"])]),
            ],
        };
        Task::from_definition(&def, &["IV".to_string(), "EV1".to_string()], None).unwrap()
    }

    #[test]
    fn derived_columns_follow_procedure_order() {
        let task = sample_task();
        assert_eq!(task.columns(), &["IV".to_string(), "EV1".to_string()]);
        for division in task.divisions() {
            assert_eq!(division.column_count(), 2);
        }
    }

    #[test]
    fn task_without_divisions_is_rejected() {
        let def = TaskDefinition {
            title: "Empty".to_string(),
            start: None,
            columns: Vec::new(),
            steps: Vec::new(),
        };
        let err = Task::from_definition(&def, &[], None).unwrap_err();
        assert!(err.contains("no divisions"));
    }

    #[test]
    fn undeclared_column_is_rejected() {
        let def = TaskDefinition {
            title: "Stray".to_string(),
            start: None,
            columns: Vec::new(),
            steps: vec![division(&[("EV3", &["wave"])])],
        };
        let err = Task::from_definition(&def, &["IV".to_string()], None).unwrap_err();
        assert!(err.contains("EV3"));
    }

    #[test]
    fn insert_division_goes_before_index() {
        let mut task = sample_task();
        let first = task.divisions()[0].id();

        let inserted = task.insert_division(0).unwrap();

        assert_eq!(task.divisions().len(), 3);
        assert_eq!(task.division_index_of(inserted), Some(0));
        assert_eq!(task.division_index_of(first), Some(1));
        assert_eq!(task.divisions()[0].column_count(), 2);
        assert_eq!(task.divisions()[0].step_count(), 0);
    }

    #[test]
    fn insert_division_rejects_end_index() {
        let mut task = sample_task();
        let err = task.insert_division(2).unwrap_err();
        assert!(matches!(err, EditError::IndexOutOfBounds { index: 2, len: 2, .. }));
        assert_eq!(task.divisions().len(), 2);
    }

    #[test]
    fn append_division_adds_at_end() {
        let mut task = sample_task();
        let appended = task.append_division();
        assert_eq!(task.division_index_of(appended), Some(2));
    }

    #[test]
    fn delete_division_shifts_and_reindexes() {
        let mut task = sample_task();
        let second = task.divisions()[1].id();
        let first = task.divisions()[0].id();

        task.delete_division(0).unwrap();

        assert_eq!(task.division_index_of(first), None);
        assert_eq!(task.division_index_of(second), Some(0));
    }

    #[test]
    fn delete_last_division_leaves_task_unchanged() {
        let mut task = sample_task();
        task.delete_division(1).unwrap();
        let remaining = task.divisions()[0].clone();

        let err = task.delete_division(0).unwrap_err();

        assert!(matches!(err, EditError::LastDivision { .. }));
        assert_eq!(task.divisions(), &[remaining]);
    }

    #[test]
    fn definition_round_trip_keeps_topology() {
        let task = sample_task();
        let reloaded = Task::from_definition(&task.definition(), &[], None).unwrap();
        assert_eq!(reloaded.columns(), task.columns());
        assert_eq!(reloaded.divisions().len(), task.divisions().len());
        assert_eq!(reloaded.step_count(), task.step_count());
    }
}
