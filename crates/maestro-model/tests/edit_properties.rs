use maestro_model::{
    DivisionDefinition, DropTarget, EditError, Procedure, ProcedureDefinition, StepDefinition,
    TaskDefinition, TaskEntry, TaskId,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::Path;

fn task_definition(title: &str, divisions: usize) -> TaskDefinition {
    let steps = (0..divisions)
        .map(|d| {
            let mut division = DivisionDefinition::new();
            division.insert(
                "IV".to_string(),
                vec![StepDefinition::Text(format!("{title} step {d}"))],
            );
            division
        })
        .collect();
    TaskDefinition {
        title: title.to_string(),
        start: None,
        columns: Vec::new(),
        steps,
    }
}

fn procedure(task_count: usize) -> Procedure {
    let definition = ProcedureDefinition {
        procedure_name: "Generated".to_string(),
        description: None,
        fields: Default::default(),
        columns: Vec::new(),
        tasks: (0..task_count)
            .map(|i| TaskEntry::Inline(task_definition(&format!("task {i}"), 2)))
            .collect(),
    };
    Procedure::from_definition(&definition, "generated", Path::new("generated.yml")).unwrap()
}

fn all_ids(procedure: &Procedure) -> HashSet<String> {
    let mut ids = HashSet::new();
    for task in procedure.tasks() {
        ids.insert(task.id().to_string());
        for division in task.divisions() {
            ids.insert(division.id().to_string());
        }
    }
    ids
}

fn id_count(procedure: &Procedure) -> usize {
    procedure.tasks().len()
        + procedure
            .tasks()
            .iter()
            .map(|t| t.divisions().len())
            .sum::<usize>()
}

proptest! {
    #[test]
    fn prop_move_then_inverse_restores_order(
        len in 1..12usize,
        from_seed in any::<usize>(),
        to_seed in any::<usize>(),
    ) {
        let mut procedure = procedure(len);
        let original = procedure.tasks().ids();
        let (from, to) = (from_seed % len, to_seed % len);

        procedure.tasks_mut().move_task(from, to).unwrap();
        procedure.tasks_mut().move_task(to, from).unwrap();

        prop_assert_eq!(procedure.tasks().ids(), original);
    }

    #[test]
    fn prop_move_keeps_index_consistent(
        len in 1..12usize,
        moves in proptest::collection::vec((any::<usize>(), any::<usize>()), 0..20),
    ) {
        let mut procedure = procedure(len);
        for (from, to) in moves {
            procedure.tasks_mut().move_task(from % len, to % len).unwrap();
        }
        for (position, id) in procedure.tasks().ids().into_iter().enumerate() {
            prop_assert_eq!(procedure.tasks().task_index_of(id), Some(position));
        }
    }

    #[test]
    fn prop_out_of_bounds_move_is_rejected(len in 1..8usize, extra in 0..5usize) {
        let mut procedure = procedure(len);
        let original = procedure.tasks().ids();

        let result = procedure.tasks_mut().move_task(0, len + extra);

        let is_out_of_bounds = matches!(result, Err(EditError::IndexOutOfBounds { .. }));
        prop_assert!(is_out_of_bounds);
        prop_assert_eq!(procedure.tasks().ids(), original);
    }

    #[test]
    fn prop_id_cardinality_changes_by_one(
        len in 2..8usize,
        ops in proptest::collection::vec((0..4u8, any::<usize>(), any::<usize>()), 1..25),
    ) {
        let mut procedure = procedure(len);

        for (op, a, b) in ops {
            let before = id_count(&procedure);
            prop_assert_eq!(all_ids(&procedure).len(), before);

            let task_len = procedure.tasks().len();
            if task_len == 0 {
                break;
            }
            let task_index = a % task_len;
            let expected = match op {
                0 if task_len > 1 => {
                    let task = procedure.tasks_mut().delete_task(task_index).unwrap();
                    before - 1 - task.divisions().len()
                }
                1 => {
                    let task = procedure.tasks().get(task_index).unwrap();
                    let (id, at) = (task.id(), b % task.divisions().len());
                    procedure.tasks_mut().insert_division(id, at).unwrap();
                    before + 1
                }
                2 => {
                    let id = procedure.tasks().get(task_index).unwrap().id();
                    procedure.tasks_mut().append_division(id).unwrap();
                    before + 1
                }
                _ => {
                    let task = procedure.tasks().get(task_index).unwrap();
                    let (id, at) = (task.id(), b % task.divisions().len());
                    match procedure.tasks_mut().delete_division(id, at) {
                        Ok(_) => before - 1,
                        Err(_) => before,
                    }
                }
            };

            prop_assert_eq!(id_count(&procedure), expected);
            prop_assert_eq!(all_ids(&procedure).len(), expected);
        }
    }

    #[test]
    fn prop_valid_drop_targets_never_no_op(len in 1..8usize, pick in any::<usize>()) {
        let procedure = procedure(len);
        let ids = procedure.tasks().ids();
        let dragged = ids[pick % len];

        for target in procedure.tasks().valid_drop_targets(dragged) {
            prop_assert_ne!(target, DropTarget::Before(dragged));
            let mut copy = procedure.clone();
            copy.tasks_mut().move_task_before(dragged, target).unwrap();
            prop_assert_ne!(copy.tasks().ids(), ids.clone());
        }
    }
}

#[test]
fn delete_only_division_leaves_task_unchanged() {
    let mut procedure = procedure(1);
    let id = procedure.tasks().ids()[0];
    procedure.tasks_mut().delete_division(id, 0).unwrap();
    let before = procedure.tasks().get(0).unwrap().definition();

    let err = procedure.tasks_mut().delete_division(id, 0).unwrap_err();

    assert!(matches!(err, EditError::LastDivision { .. }));
    let task = procedure.tasks().get(0).unwrap();
    assert_eq!(task.definition(), before);
    assert_eq!(task.divisions().len(), 1);
}

#[test]
fn dropping_before_immediate_successor_is_excluded() {
    let procedure = procedure(3);
    let ids = procedure.tasks().ids();

    let excluded = procedure.tasks().next_ids(ids[0]);
    assert!(excluded.contains(&ids[0]));
    assert!(excluded.contains(&ids[1]));
    assert!(!excluded.contains(&ids[2]));

    let targets = procedure.tasks().valid_drop_targets(ids[0]);
    assert_eq!(targets, vec![DropTarget::Before(ids[2]), DropTarget::End]);
}

#[test]
fn unknown_drag_id_is_rejected() {
    let mut procedure = procedure(2);
    let err = procedure
        .tasks_mut()
        .move_task_before(TaskId::new(), DropTarget::End)
        .unwrap_err();
    assert!(matches!(err, EditError::UnknownId { .. }));
}
