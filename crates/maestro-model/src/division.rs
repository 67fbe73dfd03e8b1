//! Division (sync block): a checkpoint-to-checkpoint window in which each
//! actor column runs its own step sequence.

use crate::definition::DivisionDefinition;
use crate::id::DivisionId;
use crate::index::Identified;
use crate::step::Step;
use crate::timing::TimeSpan;
use indexmap::IndexMap;

/// One sync block of a task
///
/// Holds exactly one step sequence per column of the owning task, in the
/// task's column order. Sequences may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Division {
    id: DivisionId,
    columns: IndexMap<String, Vec<Step>>,
}

impl Division {
    /// Division with an empty sequence for each column
    pub(crate) fn empty(columns: &[String]) -> Self {
        Self {
            id: DivisionId::new(),
            columns: columns.iter().map(|c| (c.clone(), Vec::new())).collect(),
        }
    }

    /// Build from stored form, filling absent columns with empty sequences
    ///
    /// The error string describes the offending column.
    pub(crate) fn from_definition(
        definition: &DivisionDefinition,
        columns: &[String],
    ) -> Result<Self, String> {
        if let Some(unknown) = definition.keys().find(|key| !columns.contains(key)) {
            return Err(format!("column '{unknown}' is not assigned to this task"));
        }

        let columns = columns
            .iter()
            .map(|column| {
                let steps = definition
                    .get(column)
                    .map(|steps| steps.iter().map(Step::from_definition).collect())
                    .unwrap_or_default();
                (column.clone(), steps)
            })
            .collect();

        Ok(Self {
            id: DivisionId::new(),
            columns,
        })
    }

    /// Division id
    #[inline]
    #[must_use]
    pub fn id(&self) -> DivisionId {
        self.id
    }

    /// Steps for one column
    #[must_use]
    pub fn steps(&self, column: &str) -> Option<&[Step]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    /// Mutable steps for one column
    pub fn steps_mut(&mut self, column: &str) -> Option<&mut Vec<Step>> {
        self.columns.get_mut(column)
    }

    /// `(column, steps)` pairs in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Step])> {
        self.columns
            .iter()
            .map(|(column, steps)| (column.as_str(), steps.as_slice()))
    }

    /// Number of column sequences
    #[inline]
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Total steps across columns
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    /// Longest column: columns run concurrently
    #[must_use]
    pub fn duration(&self) -> TimeSpan {
        self.columns
            .values()
            .map(|steps| steps.iter().map(|step| step.duration).sum::<TimeSpan>())
            .max()
            .unwrap_or(TimeSpan::ZERO)
    }

    /// Stored form; empty columns are omitted
    #[must_use]
    pub fn definition(&self) -> DivisionDefinition {
        self.columns
            .iter()
            .filter(|(_, steps)| !steps.is_empty())
            .map(|(column, steps)| {
                (column.clone(), steps.iter().map(Step::definition).collect())
            })
            .collect()
    }
}

impl Identified for Division {
    type Id = DivisionId;

    fn id(&self) -> DivisionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::StepDefinition;

    fn columns() -> Vec<String> {
        vec!["IV".to_string(), "EV1".to_string()]
    }

    #[test]
    fn absent_columns_are_filled() {
        let mut def = DivisionDefinition::new();
        def.insert("EV1".to_string(), vec![StepDefinition::Text("Egress".to_string())]);

        let division = Division::from_definition(&def, &columns()).unwrap();
        assert_eq!(division.column_count(), 2);
        assert_eq!(division.steps("IV").map(<[Step]>::len), Some(0));
        assert_eq!(division.steps("EV1").map(<[Step]>::len), Some(1));

        let order: Vec<_> = division.columns().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["IV", "EV1"]);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let mut def = DivisionDefinition::new();
        def.insert("EV3".to_string(), Vec::new());

        let err = Division::from_definition(&def, &columns()).unwrap_err();
        assert!(err.contains("EV3"));
    }

    #[test]
    fn duration_is_longest_column() {
        let mut division = Division::empty(&columns());
        if let Some(iv) = division.steps_mut("IV") {
            iv.push(Step::new("a").with_duration(TimeSpan::from_minutes(5)));
            iv.push(Step::new("b").with_duration(TimeSpan::from_minutes(5)));
        }
        if let Some(ev) = division.steps_mut("EV1") {
            ev.push(Step::new("c").with_duration(TimeSpan::from_minutes(7)));
        }

        assert_eq!(division.duration(), TimeSpan::from_minutes(10));
        assert_eq!(division.step_count(), 3);
    }

    #[test]
    fn empty_division_has_zero_duration() {
        assert_eq!(Division::empty(&[]).duration(), TimeSpan::ZERO);
        assert!(Division::empty(&columns()).definition().is_empty());
    }
}
