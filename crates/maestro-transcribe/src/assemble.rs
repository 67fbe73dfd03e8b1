//! Incremental builder shared by the document readers
//!
//! Readers walk their source top to bottom and report structure as it
//! opens and closes: task, division, column, step. The assembler keeps one
//! open item per layer and rejects content that arrives outside its
//! parent, naming the source file.

use crate::error::TranscribeError;
use indexmap::IndexMap;
use maestro_model::{
    ColumnDefinition, DivisionDefinition, ProcedureDefinition, Step, TaskDefinition, TaskEntry,
    TimeSpan,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub(crate) struct Assembler {
    origin: PathBuf,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) columns: Vec<ColumnDefinition>,
    tasks: Vec<TaskEntry>,
    task: Option<OpenTask>,
    division: Option<DivisionDefinition>,
    column: Option<String>,
    step: Option<Step>,
}

struct OpenTask {
    definition: TaskDefinition,
    declared: Vec<String>,
    used: Vec<String>,
}

impl Assembler {
    pub(crate) fn new(origin: &Path) -> Self {
        Self {
            origin: origin.to_path_buf(),
            name: String::new(),
            description: None,
            fields: BTreeMap::new(),
            columns: Vec::new(),
            tasks: Vec::new(),
            task: None,
            division: None,
            column: None,
            step: None,
        }
    }

    pub(crate) fn structural(&self, description: impl Into<String>) -> TranscribeError {
        TranscribeError::structural(&self.origin, description)
    }

    pub(crate) fn begin_task(&mut self, title: impl Into<String>, start: Option<TimeSpan>) -> Result<(), TranscribeError> {
        self.end_task()?;
        self.task = Some(OpenTask {
            definition: TaskDefinition {
                title: title.into(),
                start,
                columns: Vec::new(),
                steps: Vec::new(),
            },
            declared: Vec::new(),
            used: Vec::new(),
        });
        Ok(())
    }

    pub(crate) fn has_task(&self) -> bool {
        self.task.is_some()
    }

    /// Title of the open task, for formats that carry it in a child element
    pub(crate) fn task_title_mut(&mut self) -> Option<&mut String> {
        self.task.as_mut().map(|task| &mut task.definition.title)
    }

    pub(crate) fn set_task_start(&mut self, start: TimeSpan) -> Result<(), TranscribeError> {
        let task = self
            .task
            .as_mut()
            .ok_or_else(|| TranscribeError::structural(&self.origin, "start time outside a task"))?;
        task.definition.start = Some(start);
        Ok(())
    }

    /// Column the open task declares, in display order
    pub(crate) fn declare_task_column(&mut self, key: &str) -> Result<(), TranscribeError> {
        let task = self
            .task
            .as_mut()
            .ok_or_else(|| TranscribeError::structural(&self.origin, format!("column '{key}' outside a task")))?;
        if !task.declared.iter().any(|k| k == key) {
            task.declared.push(key.to_string());
        }
        Ok(())
    }

    pub(crate) fn begin_division(&mut self) -> Result<(), TranscribeError> {
        self.end_division()?;
        if self.task.is_none() {
            return Err(self.structural("division outside a task"));
        }
        self.division = Some(IndexMap::new());
        Ok(())
    }

    pub(crate) fn begin_column(&mut self, key: &str) -> Result<(), TranscribeError> {
        self.end_column()?;
        if self.division.is_none() {
            return Err(self.structural(format!("column '{key}' outside a division")));
        }
        if let Some(division) = self.division.as_mut() {
            division.entry(key.to_string()).or_default();
        }
        if let Some(task) = self.task.as_mut() {
            if !task.used.iter().any(|k| k == key) {
                task.used.push(key.to_string());
            }
        }
        self.column = Some(key.to_string());
        Ok(())
    }

    pub(crate) fn begin_step(&mut self, step: Step) -> Result<(), TranscribeError> {
        self.end_step()?;
        if self.column.is_none() {
            return Err(self.structural(format!("step '{}' outside a column", step.text)));
        }
        self.step = Some(step);
        Ok(())
    }

    pub(crate) fn step_mut(&mut self) -> Result<&mut Step, TranscribeError> {
        self.step
            .as_mut()
            .ok_or_else(|| TranscribeError::structural(&self.origin, "step detail outside a step"))
    }

    pub(crate) fn end_step(&mut self) -> Result<(), TranscribeError> {
        let Some(step) = self.step.take() else {
            return Ok(());
        };
        match (self.division.as_mut(), self.column.as_ref()) {
            (Some(division), Some(column)) => {
                division.entry(column.clone()).or_default().push(step.definition());
                Ok(())
            }
            _ => Err(TranscribeError::structural(
                &self.origin,
                format!("step '{}' outside a column", step.text),
            )),
        }
    }

    pub(crate) fn end_column(&mut self) -> Result<(), TranscribeError> {
        self.end_step()?;
        self.column = None;
        Ok(())
    }

    pub(crate) fn end_division(&mut self) -> Result<(), TranscribeError> {
        self.end_column()?;
        if let Some(division) = self.division.take() {
            if let Some(task) = self.task.as_mut() {
                task.definition.steps.push(division);
            }
        }
        Ok(())
    }

    pub(crate) fn end_task(&mut self) -> Result<(), TranscribeError> {
        self.end_division()?;
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };
        if task.definition.title.trim().is_empty() {
            return Err(self.structural("task without a title"));
        }
        for key in task.used {
            if !task.declared.contains(&key) {
                task.declared.push(key);
            }
        }
        task.definition.columns = task.declared;
        self.tasks.push(TaskEntry::Inline(task.definition));
        Ok(())
    }

    /// Close anything still open and produce the definition
    pub(crate) fn finish(mut self) -> Result<ProcedureDefinition, TranscribeError> {
        self.end_task()?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(self.structural("no procedure name found"));
        }
        Ok(ProcedureDefinition {
            procedure_name: name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            fields: self.fields,
            columns: self.columns,
            tasks: self.tasks,
        })
    }
}
