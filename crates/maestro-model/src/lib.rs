//! Maestro Model - procedure data model
//!
//! The canonical in-memory form of a procedure:
//! - `Procedure` owns an ordered `TasksHandler`
//! - each `Task` owns an ordered sequence of `Division`s
//! - each `Division` owns one `Step` sequence per actor column
//!
//! Ids are minted on load and looked up through position indexes that are
//! rebuilt after every structural edit.
//!
//! # Example
//!
//! ```rust,ignore
//! use maestro_model::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut procedure = Procedure::load("procedures/egress.yml").await?;
//! procedure.tasks_mut().move_task(0, 2)?;
//!
//! for timing in procedure.timeline() {
//!     if timing.has_gap() {
//!         println!("{} idle before {}", timing.gap_before, timing.task_id);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod definition;
pub mod division;
pub mod error;
pub mod id;
pub mod index;
pub mod procedure;
pub mod step;
pub mod task;
pub mod tasks_handler;
pub mod timing;

pub use definition::{
    ColumnDefinition, DetailedStep, DivisionDefinition, ProcedureDefinition, StepDefinition,
    TaskDefinition, TaskEntry,
};
pub use division::Division;
pub use error::{DefinitionError, EditError};
pub use id::{DivisionId, TaskId};
pub use index::{Identified, PositionIndex};
pub use procedure::{
    is_plain_file_name, write_serialized, Column, Procedure, SerializedProcedure, DOCUMENT_ID_FIELD,
};
pub use step::Step;
pub use task::Task;
pub use tasks_handler::{DropTarget, TasksHandler};
pub use timing::{TaskTiming, TimeSpan};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with procedures
    pub use crate::{
        DefinitionError, Division, DivisionId, DropTarget, EditError, Procedure,
        ProcedureDefinition, Step, Task, TaskDefinition, TaskId, TaskTiming, TasksHandler,
        TimeSpan,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
